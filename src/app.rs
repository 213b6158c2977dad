use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use lsp_serve::capabilities::WorkspaceProvider;
use lsp_serve::lsp::{Dispatcher, Session, StreamTransport};

use crate::cli::{Config, Mode};

pub async fn run(config: Config) -> anyhow::Result<()> {
    let dispatcher = Arc::new(Dispatcher::<WorkspaceProvider>::new());

    match config.mode {
        Mode::Stdio => serve_stdio(&config, dispatcher).await,
        Mode::Tcp => serve_tcp(&config, dispatcher).await,
    }
}

async fn serve_stdio(
    config: &Config,
    dispatcher: Arc<Dispatcher<WorkspaceProvider>>,
) -> anyhow::Result<()> {
    info!("serving on stdio");
    serve_stream(
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.max_content_length,
        dispatcher,
    )
    .await
    .context("serving stdio client")
}

async fn serve_tcp(
    config: &Config,
    dispatcher: Arc<Dispatcher<WorkspaceProvider>>,
) -> anyhow::Result<()> {
    let port = config.port.context("--port is required in tcp mode")?;
    let listener = TcpListener::bind((config.iface.as_str(), port))
        .await
        .context("creating listener")?;
    let addr = listener.local_addr().context("reading listener address")?;
    info!(%addr, "listening");

    accept_loop(listener, config.max_content_length, dispatcher).await
}

/// Accept until Ctrl-C; each client gets its own task and provider.
async fn accept_loop(
    listener: TcpListener,
    max_content_length: usize,
    dispatcher: Arc<Dispatcher<WorkspaceProvider>>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                spawn_client(accepted, max_content_length, &dispatcher);
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    error!(%err, "ctrl-c signal handler failed");
                }
                info!("shutting down listener");
                return Ok(());
            }
        }
    }
}

/// A failed accept is logged and skipped; the listener stays up.
fn spawn_client(
    accepted: io::Result<(TcpStream, SocketAddr)>,
    max_content_length: usize,
    dispatcher: &Arc<Dispatcher<WorkspaceProvider>>,
) -> Option<JoinHandle<()>> {
    let (stream, peer) = match accepted {
        Ok(accepted) => accepted,
        Err(err) => {
            warn!(%err, "accept failed");
            return None;
        }
    };
    info!(%peer, "client connected");
    let dispatcher = Arc::clone(dispatcher);
    Some(tokio::spawn(async move {
        if let Err(err) = handle_client(stream, max_content_length, dispatcher).await {
            warn!(%peer, error = %format!("{err:#}"), "handling client");
        }
        info!(%peer, "client disconnected");
    }))
}

async fn handle_client(
    stream: TcpStream,
    max_content_length: usize,
    dispatcher: Arc<Dispatcher<WorkspaceProvider>>,
) -> anyhow::Result<()> {
    let (reader, writer) = stream.into_split();
    serve_stream(reader, writer, max_content_length, dispatcher)
        .await
        .context("serving tcp client")
}

async fn serve_stream<R, W>(
    reader: R,
    writer: W,
    max_content_length: usize,
    dispatcher: Arc<Dispatcher<WorkspaceProvider>>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let transport =
        StreamTransport::new(reader, writer).with_max_content_length(max_content_length);
    let mut session = Session::new(transport, WorkspaceProvider::new(), dispatcher);
    session.run().await?;
    Ok(())
}
