use serde_json::value::RawValue;

use crate::lsp::error::{error_codes, DispatchError, ErrorKind};
use crate::lsp::header::CONTENT_LENGTH;
use crate::lsp::types::{
    ResponseEnvelope, ResponseError, ResponseErrorMessage, ResponseMessage, JSONRPC_VERSION,
};

pub fn create_response(id: i64, result: Box<RawValue>) -> ResponseEnvelope {
    ResponseEnvelope::Result(ResponseMessage {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result,
    })
}

pub fn create_error_response(id: i64, error: &DispatchError) -> ResponseEnvelope {
    ResponseEnvelope::Error(ResponseErrorMessage {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        error: ResponseError::from(error),
    })
}

/// Answer for a body that carried an id but no method.
pub fn create_missing_method_response(id: i64) -> ResponseEnvelope {
    ResponseEnvelope::Error(ResponseErrorMessage {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        error: ResponseError {
            code: error_codes::INVALID_REQUEST,
            message: "missing method".to_string(),
            data: None,
        },
    })
}

pub fn null_result() -> Result<Box<RawValue>, DispatchError> {
    serde_json::value::to_raw_value(&serde_json::Value::Null).map_err(encode_error)
}

/// Serialize the envelope shell; the result payload is copied through as-is.
pub fn encode_response(response: &ResponseEnvelope) -> Result<Vec<u8>, DispatchError> {
    serde_json::to_vec(response).map_err(encode_error)
}

/// Prefix a body with its `Content-Length` header.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let header = format!("{}: {}\r\n\r\n", CONTENT_LENGTH, body.len());
    let mut framed = Vec::with_capacity(header.len() + body.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(body);
    framed
}

fn encode_error(err: serde_json::Error) -> DispatchError {
    DispatchError::new(ErrorKind::Transport, format!("encoding response: {err}"))
}
