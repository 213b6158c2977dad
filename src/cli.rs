use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, ValueEnum};

use lsp_serve::lsp::header::MAX_CONTENT_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Stdio,
    Tcp,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub iface: String,
    pub port: Option<u16>,
    pub logfile: Option<PathBuf>,
    pub max_content_length: usize,
}

#[derive(Parser, Debug)]
#[command(name = "lsp_serve")]
#[command(about = "Serve the Language Server Protocol over TCP or stdio", long_about = None)]
pub struct Cli {
    /// communication mode
    #[arg(short = 'c', long, value_enum, default_value = "tcp")]
    pub mode: Mode,
    /// interface to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub iface: String,
    /// port to bind to (tcp mode)
    #[arg(long)]
    pub port: Option<u16>,
    /// also log to this file under logger/, in addition to stderr
    #[arg(long)]
    pub logfile: Option<String>,
    #[arg(long, default_value_t = MAX_CONTENT_LENGTH)]
    pub max_content_length: usize,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> anyhow::Result<Config> {
        if self.mode == Mode::Tcp {
            if self.iface.is_empty() {
                bail!("--iface is required");
            }
            if self.port.is_none() {
                bail!("--port is required in tcp mode");
            }
        }

        Ok(Config {
            mode: self.mode,
            iface: self.iface,
            port: self.port,
            logfile: self
                .logfile
                .map(|name| PathBuf::from("logger").join(name)),
            max_content_length: self.max_content_length,
        })
    }
}
