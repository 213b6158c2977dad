use tokio::io::{AsyncRead, AsyncReadExt};

use crate::lsp::error::{DispatchError, ErrorKind};

const CHUNK_SIZE: usize = 8 * 1024;

/// Reads exactly `content_length` bytes, accumulating across short reads.
///
/// Only the announced length decides where the body ends; nothing past it is
/// consumed from `reader`.
pub async fn read_body<R>(reader: &mut R, content_length: usize) -> Result<Vec<u8>, DispatchError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut body = Vec::with_capacity(content_length);
    let mut chunk = [0u8; CHUNK_SIZE];

    while body.len() < content_length {
        let wanted = (content_length - body.len()).min(CHUNK_SIZE);
        let read = reader.read(&mut chunk[..wanted]).await?;
        if read == 0 {
            return Err(DispatchError::new(
                ErrorKind::ShortBody,
                format!(
                    "stream ended after {} of {} body bytes",
                    body.len(),
                    content_length
                ),
            ));
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(body)
}
