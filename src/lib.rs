//! Framing and dispatch core of a Language Server Protocol server.
//!
//! [`lsp::Session`] drives one client stream: it reads `Content-Length`
//! framed JSON-RPC messages, routes each request through a
//! [`lsp::Dispatcher`] to a [`lsp::CapabilityProvider`], and writes exactly
//! one framed response per request.
pub mod capabilities;
pub mod lsp;
