use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::lsp::error::DispatchError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug)]
pub struct RequestEnvelope {
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    pub params: Option<Box<RawValue>>,
}

impl RequestEnvelope {
    pub fn new(id: i64, method: String, params: Option<Box<RawValue>>) -> Self {
        RequestEnvelope {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        }
    }
}

#[derive(Debug)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Box<RawValue>>,
}

impl Notification {
    pub fn new(method: String, params: Option<Box<RawValue>>) -> Self {
        Notification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<&DispatchError> for ResponseError {
    fn from(err: &DispatchError) -> Self {
        ResponseError {
            code: err.code(),
            message: err.message.clone(),
            data: None,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ResponseMessage {
    pub jsonrpc: String,
    pub id: i64,
    pub result: Box<RawValue>,
}

#[derive(Serialize, Debug)]
pub struct ResponseErrorMessage {
    pub jsonrpc: String,
    pub id: i64,
    pub error: ResponseError,
}

/// A response carries either a result or an error, never both.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Result(ResponseMessage),
    Error(ResponseErrorMessage),
}

impl ResponseEnvelope {
    pub fn id(&self) -> i64 {
        match self {
            ResponseEnvelope::Result(r) => r.id,
            ResponseEnvelope::Error(e) => e.id,
        }
    }
}

/// One decoded inbound body.
#[derive(Debug)]
pub enum Message {
    Request(RequestEnvelope),
    Notification(Notification),
    /// A body with no method (`{}` or empty); the client has nothing more to send.
    Terminal { id: Option<i64> },
    /// Structurally invalid, but the id survived so the client can be told.
    Invalid { id: i64, error: DispatchError },
}
