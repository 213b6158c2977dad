//! Error taxonomy for the framing and dispatch core.
use std::fmt;

use thiserror::Error;

/// Standard JSON-RPC error codes used in error responses.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedContentType,
    MalformedHeader,
    ShortBody,
    MalformedJson,
    UnknownMethod,
    InvalidParams,
    HandlerFailure,
    /// Read or write failure on the underlying stream.
    Transport,
}

impl ErrorKind {
    /// Transport-level kinds end the connection; the rest become error responses.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::UnsupportedContentType
                | ErrorKind::MalformedHeader
                | ErrorKind::ShortBody
                | ErrorKind::Transport
        )
    }

    pub fn code(self) -> i32 {
        match self {
            ErrorKind::MalformedJson => error_codes::PARSE_ERROR,
            ErrorKind::UnknownMethod => error_codes::METHOD_NOT_FOUND,
            ErrorKind::InvalidParams => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedContentType => "unsupported content type",
            ErrorKind::MalformedHeader => "malformed header",
            ErrorKind::ShortBody => "short body",
            ErrorKind::MalformedJson => "malformed json",
            ErrorKind::UnknownMethod => "unknown method",
            ErrorKind::InvalidParams => "invalid params",
            ErrorKind::HandlerFailure => "handler failure",
            ErrorKind::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure anywhere between reading a header and writing a response.
///
/// The message is what a client sees in `error.message` when the failure is
/// answered with a JSON-RPC error response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        DispatchError {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedHeader, message)
    }

    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedJson, message)
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(
            ErrorKind::UnknownMethod,
            format!("unsupported method: {method:?}"),
        )
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::new(ErrorKind::Transport, err.to_string())
    }
}
