//! LSP transport abstraction (framed Content-Length messages).
use async_trait::async_trait;

use crate::lsp::error::DispatchError;
use crate::lsp::header::Header;

/// Minimal async trait for the server side of an LSP byte stream.
/// - `read_header` returns `None` once the peer has nothing more to send.
/// - `read_body` returns exactly `header.content_length` bytes.
/// - `write_message` takes a JSON body (not including headers), frames it and flushes.
#[async_trait]
pub trait LspTransport: Send {
    async fn read_header(&mut self) -> Result<Option<Header>, DispatchError>;
    async fn read_body(&mut self, header: &Header) -> Result<Vec<u8>, DispatchError>;
    async fn write_message(&mut self, json_body: &[u8]) -> Result<(), DispatchError>;
    async fn close(&mut self) -> Result<(), DispatchError>;
}
