//! Per-connection read → dispatch → respond loop.
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::lsp::backend::CapabilityProvider;
use crate::lsp::dispatcher::Dispatcher;
use crate::lsp::error::DispatchError;
use crate::lsp::message_creator::{
    create_error_response, create_missing_method_response, create_response, encode_response,
    null_result,
};
use crate::lsp::message_parser::parse_message;
use crate::lsp::transport::LspTransport;
use crate::lsp::types::{Message, ResponseEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHeader,
    AwaitingBody,
    Dispatching,
    Responding,
    Closed,
}

/// What one pass through the loop decided.
enum Cycle {
    Continue,
    Last,
}

/// Owns one client stream and its provider. Requests are handled strictly one
/// at a time: the next header is not read until the previous response has
/// been written.
pub struct Session<T, P> {
    transport: T,
    provider: P,
    dispatcher: Arc<Dispatcher<P>>,
    state: SessionState,
}

impl<T, P> Session<T, P>
where
    T: LspTransport,
    P: CapabilityProvider,
{
    pub fn new(transport: T, provider: P, dispatcher: Arc<Dispatcher<P>>) -> Self {
        Session {
            transport,
            provider,
            dispatcher,
            state: SessionState::AwaitingHeader,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Serve until the client stops sending or a transport-level error occurs.
    /// The stream is closed on every path.
    pub async fn run(&mut self) -> Result<(), DispatchError> {
        let outcome = self.serve().await;
        if let Err(err) = &outcome {
            warn!(kind = %err.kind, error = %err, state = ?self.state, "closing connection");
        }
        self.state = SessionState::Closed;
        if let Err(err) = self.transport.close().await {
            debug!(error = %err, "closing transport");
        }
        outcome
    }

    async fn serve(&mut self) -> Result<(), DispatchError> {
        loop {
            match self.cycle().await? {
                Cycle::Continue => continue,
                Cycle::Last => return Ok(()),
            }
        }
    }

    async fn cycle(&mut self) -> Result<Cycle, DispatchError> {
        self.state = SessionState::AwaitingHeader;
        let Some(header) = self.transport.read_header().await? else {
            info!("client closed the stream");
            return Ok(Cycle::Last);
        };
        header.ensure_supported_content_type()?;

        self.state = SessionState::AwaitingBody;
        let body = self.transport.read_body(&header).await?;

        self.state = SessionState::Dispatching;
        let (response, cycle) = match parse_message(&body)? {
            Message::Request(request) => {
                debug!(method = %request.method, id = request.id, "received request");
                let outcome = self
                    .dispatcher
                    .dispatch(&mut self.provider, &request.method, request.params.as_deref())
                    .await;
                let response = match outcome {
                    Ok(Some(result)) => create_response(request.id, result),
                    Ok(None) => create_response(request.id, null_result()?),
                    Err(err) => {
                        warn!(method = %request.method, id = request.id, error = %err, "request failed");
                        create_error_response(request.id, &err)
                    }
                };
                (Some(response), Cycle::Continue)
            }
            Message::Notification(notification) => {
                debug!(method = %notification.method, "received notification");
                let outcome = self
                    .dispatcher
                    .dispatch(
                        &mut self.provider,
                        &notification.method,
                        notification.params.as_deref(),
                    )
                    .await;
                if let Err(err) = outcome {
                    // notifications never get a response
                    debug!(method = %notification.method, error = %err, "notification dropped");
                }
                (None, Cycle::Continue)
            }
            Message::Invalid { id, error } => {
                warn!(id, error = %error, "invalid request");
                (Some(create_error_response(id, &error)), Cycle::Continue)
            }
            Message::Terminal { id } => {
                info!(?id, "received terminal message");
                (id.map(create_missing_method_response), Cycle::Last)
            }
        };

        if let Some(response) = response {
            self.state = SessionState::Responding;
            self.respond(&response).await?;
        }
        Ok(cycle)
    }

    async fn respond(&mut self, response: &ResponseEnvelope) -> Result<(), DispatchError> {
        let body = encode_response(response)?;
        debug!(id = response.id(), len = body.len(), "sending response");
        self.transport.write_message(&body).await
    }
}
