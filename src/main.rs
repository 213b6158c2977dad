mod app;
mod cli;

use std::fs::{self, File};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::from_args().into_config()?;
    init_tracing(&config)?;

    app::run(config).await
}

// stdout carries protocol frames in stdio mode, so logs go to stderr
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    match &config.logfile {
        None => subscriber
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!("failed to init tracing: {err}"))?,
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating log directory {}", dir.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            subscriber
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Arc::new(file)))
                .try_init()
                .map_err(|err| anyhow::anyhow!("failed to init tracing: {err}"))?
        }
    }

    Ok(())
}
