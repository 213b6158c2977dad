//! Header block parsing (`Content-Length` / `Content-Type` framing).
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::trace;

use crate::lsp::error::{DispatchError, ErrorKind};

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DEFAULT_CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";

/// Upper bound on announced body sizes unless configured otherwise.
pub const MAX_CONTENT_LENGTH: usize = 1 << 20;

/// Longest single header line accepted, line ending included.
pub const MAX_HEADER_LINE: usize = 8 * 1024;
/// Longest header block accepted, blank line included.
pub const MAX_HEADER_BLOCK: usize = 64 * 1024;

const SEPARATOR: &str = ": ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub content_length: usize,
    pub content_type: Option<String>,
}

impl Header {
    /// Absent content types are treated as the LSP default.
    pub fn ensure_supported_content_type(&self) -> Result<(), DispatchError> {
        match self.content_type.as_deref() {
            None | Some(DEFAULT_CONTENT_TYPE) => Ok(()),
            Some(other) => Err(DispatchError::new(
                ErrorKind::UnsupportedContentType,
                format!("unsupported content type: {other:?}"),
            )),
        }
    }
}

/// Reads header lines up to and including the blank line.
///
/// Returns `Ok(None)` when the stream ends before the first byte of a new
/// header, which is how a client ends a session. Ending anywhere inside the
/// header block is an error.
pub async fn read_header<R>(
    reader: &mut R,
    max_content_length: usize,
) -> Result<Option<Header>, DispatchError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut content_length: Option<usize> = None;
    let mut content_type: Option<String> = None;
    let mut started = false;
    let mut remaining = MAX_HEADER_BLOCK;
    let mut line = Vec::new();

    loop {
        if remaining == 0 {
            return Err(DispatchError::malformed_header(format!(
                "header block exceeds {MAX_HEADER_BLOCK} bytes"
            )));
        }
        let limit = MAX_HEADER_LINE.min(remaining);
        line.clear();
        let read = (&mut *reader)
            .take(limit as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            if !started {
                return Ok(None);
            }
            return Err(DispatchError::malformed_header("no body contained"));
        }
        started = true;
        remaining -= read;

        if line.last() != Some(&b'\n') {
            if read == limit {
                let message = if limit < MAX_HEADER_LINE {
                    format!("header block exceeds {MAX_HEADER_BLOCK} bytes")
                } else {
                    format!("header line exceeds {MAX_HEADER_LINE} bytes")
                };
                return Err(DispatchError::malformed_header(message));
            }
            // partial line, then EOF
            return Err(DispatchError::malformed_header("no body contained"));
        }
        let text = trim_line_ending(&line)?;
        trace!(line = text, "header line");
        if text.is_empty() {
            break;
        }

        let (name, value) = split_once(text, SEPARATOR)?;
        match name {
            CONTENT_LENGTH => content_length = Some(parse_content_length(value)?),
            CONTENT_TYPE => content_type = Some(value.to_string()),
            _ => {}
        }
    }

    let content_length = content_length
        .ok_or_else(|| DispatchError::malformed_header("missing Content-Length header"))?;
    if content_length > max_content_length {
        return Err(DispatchError::malformed_header(format!(
            "Content-Length {content_length} exceeds limit of {max_content_length} bytes"
        )));
    }

    Ok(Some(Header {
        content_length,
        content_type,
    }))
}

fn trim_line_ending(line: &[u8]) -> Result<&str, DispatchError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line)
        .map_err(|e| DispatchError::malformed_header(format!("header is not valid UTF-8: {e}")))
}

pub(crate) fn split_once<'a>(
    line: &'a str,
    separator: &str,
) -> Result<(&'a str, &'a str), DispatchError> {
    line.split_once(separator).ok_or_else(|| {
        DispatchError::malformed_header(format!("separator {separator:?} not found in {line:?}"))
    })
}

fn parse_content_length(value: &str) -> Result<usize, DispatchError> {
    let invalid = || DispatchError::malformed_header(format!("invalid Content-Length: {value:?}"));
    // `usize::from_str` would also take a leading `+`
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse::<usize>().map_err(|_| invalid())
}
