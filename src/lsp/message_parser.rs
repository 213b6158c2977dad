use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::lsp::error::DispatchError;
use crate::lsp::types::{
    Message, Notification, RequestEnvelope, ResponseEnvelope, ResponseError,
    ResponseErrorMessage, ResponseMessage, JSONRPC_VERSION,
};

/// Permissive view of an inbound body; validation happens in `parse_message`.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    jsonrpc: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<Value>,
    #[serde(default)]
    params: Option<Box<RawValue>>,
}

#[derive(Deserialize)]
struct RawResponse {
    jsonrpc: String,
    id: i64,
    #[serde(default, deserialize_with = "present")]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<ResponseError>,
}

// keeps an explicit `"result": null` distinct from a missing field
fn present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

// Derived struct deserializers also accept JSON arrays as positional fields.
fn ensure_object(body: &[u8], what: &str) -> Result<(), DispatchError> {
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(()),
        _ => Err(DispatchError::malformed_json(format!(
            "{what} is not a JSON object"
        ))),
    }
}

/// Decode an exact-length body into a request, notification or terminal marker.
///
/// Errors returned here carry no recoverable id and end the connection;
/// problems found after the id is known come back as `Message::Invalid`.
pub fn parse_message(body: &[u8]) -> Result<Message, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Message::Terminal { id: None });
    }
    ensure_object(body, "body")?;

    let raw: RawEnvelope = serde_json::from_slice(body)
        .map_err(|e| DispatchError::malformed_json(format!("decoding body: {e}")))?;

    let id = match raw.id {
        None => None,
        Some(value) => Some(value.as_i64().ok_or_else(|| {
            DispatchError::malformed_json(format!("unsupported request id: {value}"))
        })?),
    };

    if let Some(version) = raw.jsonrpc {
        if version.as_str() != Some(JSONRPC_VERSION) {
            return invalid(
                id,
                DispatchError::malformed_json(format!("unsupported jsonrpc version: {version}")),
            );
        }
    }

    let method = match raw.method {
        None => return Ok(Message::Terminal { id }),
        Some(Value::String(method)) => method,
        Some(other) => {
            return invalid(
                id,
                DispatchError::malformed_json(format!("method must be a string, got {other}")),
            )
        }
    };

    Ok(match id {
        Some(id) => Message::Request(RequestEnvelope::new(id, method, raw.params)),
        None => Message::Notification(Notification::new(method, raw.params)),
    })
}

fn invalid(id: Option<i64>, error: DispatchError) -> Result<Message, DispatchError> {
    match id {
        Some(id) => Ok(Message::Invalid { id, error }),
        None => Err(error),
    }
}

/// Decode a response body, as a client would read what the session writes.
pub fn parse_response(body: &[u8]) -> Result<ResponseEnvelope, DispatchError> {
    ensure_object(body, "response")?;
    let raw: RawResponse = serde_json::from_slice(body)
        .map_err(|e| DispatchError::malformed_json(format!("decoding response: {e}")))?;

    match (raw.result, raw.error) {
        (Some(result), None) => Ok(ResponseEnvelope::Result(ResponseMessage {
            jsonrpc: raw.jsonrpc,
            id: raw.id,
            result,
        })),
        (None, Some(error)) => Ok(ResponseEnvelope::Error(ResponseErrorMessage {
            jsonrpc: raw.jsonrpc,
            id: raw.id,
            error,
        })),
        (Some(_), Some(_)) => Err(DispatchError::malformed_json(
            "response carries both result and error",
        )),
        (None, None) => Err(DispatchError::malformed_json(
            "response carries neither result nor error",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::error::ErrorKind;

    #[test]
    fn parses_request_with_raw_params() {
        let body = br#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"rootUri":"file:///tmp/ws"}}"#;
        match parse_message(body).expect("parse") {
            Message::Request(request) => {
                assert_eq!(request.id, 0);
                assert_eq!(request.method, "initialize");
                assert_eq!(
                    request.params.expect("params").get(),
                    r#"{"rootUri":"file:///tmp/ws"}"#
                );
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn method_without_id_is_a_notification() {
        let body = br#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#;
        match parse_message(body).expect("parse") {
            Message::Notification(notification) => {
                assert_eq!(notification.method, "initialized")
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn empty_object_and_empty_body_are_terminal() {
        assert!(matches!(
            parse_message(b"{}").expect("parse"),
            Message::Terminal { id: None }
        ));
        assert!(matches!(
            parse_message(b"").expect("parse"),
            Message::Terminal { id: None }
        ));
        assert!(matches!(
            parse_message(br#"{"jsonrpc":"2.0","id":4}"#).expect("parse"),
            Message::Terminal { id: Some(4) }
        ));
    }

    #[test]
    fn null_id_counts_as_absent() {
        let body = br#"{"jsonrpc":"2.0","id":null,"method":"initialized"}"#;
        assert!(matches!(
            parse_message(body).expect("parse"),
            Message::Notification(_)
        ));
    }

    #[test]
    fn invalid_json_is_fatal() {
        let err = parse_message(b"{\"id\": 1,").expect_err("truncated json");
        assert_eq!(err.kind, ErrorKind::MalformedJson);

        let err = parse_message(b"[1, 2]").expect_err("not an object");
        assert_eq!(err.kind, ErrorKind::MalformedJson);
    }

    #[test]
    fn arrays_and_scalars_are_not_envelopes() {
        let bodies: [&[u8]; 6] = [
            br#"["2.0", 5, "initialize", {"capabilities":{}}]"#,
            b"[]",
            b"  [1, 2]",
            b"42",
            br#""initialize""#,
            b"null",
        ];
        for body in bodies {
            let err = parse_message(body).expect_err("non-object body");
            assert_eq!(err.kind, ErrorKind::MalformedJson);
        }
    }

    #[test]
    fn whitespace_only_body_is_terminal() {
        assert!(matches!(
            parse_message(b" \r\n\t ").expect("parse"),
            Message::Terminal { id: None }
        ));
    }

    #[test]
    fn leading_whitespace_before_object_is_fine() {
        assert!(matches!(
            parse_message(b"\r\n {\"jsonrpc\":\"2.0\",\"method\":\"initialized\"}").expect("parse"),
            Message::Notification(_)
        ));
    }

    #[test]
    fn non_integer_id_is_fatal() {
        let err = parse_message(br#"{"id":"abc","method":"initialize"}"#).expect_err("string id");
        assert_eq!(err.kind, ErrorKind::MalformedJson);
    }

    #[test]
    fn bad_method_with_id_is_answerable() {
        match parse_message(br#"{"jsonrpc":"2.0","id":9,"method":42}"#).expect("parse") {
            Message::Invalid { id, error } => {
                assert_eq!(id, 9);
                assert_eq!(error.kind, ErrorKind::MalformedJson);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let err = parse_message(br#"{"jsonrpc":"2.0","method":42}"#).expect_err("no id");
        assert_eq!(err.kind, ErrorKind::MalformedJson);
    }

    #[test]
    fn wrong_version_is_rejected() {
        assert!(matches!(
            parse_message(br#"{"jsonrpc":"1.0","id":3,"method":"initialize"}"#).expect("parse"),
            Message::Invalid { id: 3, .. }
        ));
    }

    #[test]
    fn parses_error_response() {
        let body = br#"{"jsonrpc":"2.0","id":5,"error":{"code":-32601,"message":"nope"}}"#;
        match parse_response(body).expect("parse") {
            ResponseEnvelope::Error(response) => {
                assert_eq!(response.id, 5);
                assert_eq!(response.error.code, -32601);
                assert_eq!(response.error.message, "nope");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn null_result_is_still_a_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        match parse_response(body).expect("parse") {
            ResponseEnvelope::Result(response) => assert_eq!(response.result.get(), "null"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn response_needs_exactly_one_payload() {
        let both = br#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#;
        assert!(parse_response(both).is_err());
        assert!(parse_response(br#"{"jsonrpc":"2.0","id":1}"#).is_err());
    }

    #[test]
    fn array_response_is_rejected() {
        let err = parse_response(br#"["2.0", 1, null, null]"#).expect_err("array response");
        assert_eq!(err.kind, ErrorKind::MalformedJson);
    }
}
