//! Framing over any duplex byte stream (TCP halves, stdin/stdout, in-memory pipes).
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

use crate::lsp::body::read_body;
use crate::lsp::error::DispatchError;
use crate::lsp::header::{read_header, Header, MAX_CONTENT_LENGTH};
use crate::lsp::message_creator::frame;
use crate::lsp::transport::LspTransport;

pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    max_content_length: usize,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        StreamTransport {
            reader: BufReader::new(reader),
            writer,
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }

    pub fn with_max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }
}

#[async_trait]
impl<R, W> LspTransport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_header(&mut self) -> Result<Option<Header>, DispatchError> {
        read_header(&mut self.reader, self.max_content_length).await
    }

    async fn read_body(&mut self, header: &Header) -> Result<Vec<u8>, DispatchError> {
        // the BufReader may already hold part of the body from header reads
        read_body(&mut self.reader, header.content_length).await
    }

    async fn write_message(&mut self, json_body: &[u8]) -> Result<(), DispatchError> {
        trace!(len = json_body.len(), "writing message");
        self.writer.write_all(&frame(json_body)).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DispatchError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
