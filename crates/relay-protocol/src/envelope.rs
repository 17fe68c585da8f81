//! Envelope wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RpcError;

/// Protocol-version tag every envelope must carry in its `jsonrpc` field.
pub const PROTOCOL_TAG: &str = "2.0";

/// Sentinel id used when replying to an envelope that carried no `id`.
pub const UNKNOWN_ID: &str = "unknown";

/// Envelope as decoded from the wire, before shape validation.
///
/// Each field is `Some` when the key was present, even if its value was
/// `null`, so validation can tell "absent" apart from "null".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawEnvelope {
    /// `jsonrpc` member.
    pub jsonrpc: Option<Value>,
    /// `id` member.
    pub id: Option<Value>,
    /// `method` member.
    pub method: Option<Value>,
    /// `params` member.
    pub params: Option<Value>,
    /// `result` member.
    pub result: Option<Value>,
    /// `error` member.
    pub error: Option<Value>,
    /// Whether the top-level JSON value was an object at all.
    pub is_object: bool,
}

/// A validated inbound envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// Has `method` and `id`; expects a response.
    Request(Request),
    /// Has `method`, no `id`.
    Notification(Notification),
    /// Has `id` and exactly one of `result` / `error`.
    Response(Response),
}

/// Inbound request.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Caller-chosen identifier, echoed in the response.
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    pub params: Option<Value>,
}

/// Notification (inbound or outbound).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Protocol-version tag.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Build a notification with the fixed protocol tag.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: PROTOCOL_TAG.to_owned(),
            method: method.into(),
            params,
        }
    }
}

/// `{code, message, data?}` error triple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Registered error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response envelope (inbound or outbound).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol-version tag.
    pub jsonrpc: String,
    /// Echoed request id. Absent only for parse failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Build a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: PROTOCOL_TAG.to_owned(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response addressed to `id` (or no id at all).
    pub fn error(id: Option<Value>, err: &RpcError) -> Self {
        Self {
            jsonrpc: PROTOCOL_TAG.to_owned(),
            id,
            result: None,
            error: Some(err.to_error_object()),
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Anything the server pushes to a client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundEnvelope {
    /// Reply to a request.
    Response(Response),
    /// Server-initiated notification (e.g. keep-alive).
    Notification(Notification),
}

impl From<Response> for OutboundEnvelope {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

impl From<Notification> for OutboundEnvelope {
    fn from(value: Notification) -> Self {
        Self::Notification(value)
    }
}

/// Reply id for an inbound envelope that may or may not have carried one.
pub fn reply_id(id: Option<&Value>) -> Value {
    match id {
        Some(v) if !v.is_null() => v.clone(),
        _ => Value::String(UNKNOWN_ID.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_response_serializes_without_error() {
        let resp = Response::success(json!(1), json!({"ok": true}));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["id"], 1);
        assert_eq!(v["result"]["ok"], true);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn error_without_id_omits_field() {
        let resp = Response::error(
            None,
            &RpcError::Parse {
                message: "eof".into(),
            },
        );
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v.get("id").is_none());
        assert_eq!(v["error"]["code"], -32700);
        assert!(v.get("result").is_none());
    }

    #[test]
    fn outbound_notification_is_untagged() {
        let out: OutboundEnvelope =
            Notification::new("notifications/heartbeat", Some(json!({"timestamp": "t"}))).into();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["method"], "notifications/heartbeat");
        assert_eq!(v["params"]["timestamp"], "t");
        assert!(v.get("id").is_none());
    }

    #[test]
    fn reply_id_falls_back_to_sentinel() {
        assert_eq!(reply_id(Some(&json!("abc"))), json!("abc"));
        assert_eq!(reply_id(Some(&json!(7))), json!(7));
        assert_eq!(reply_id(Some(&Value::Null)), json!(UNKNOWN_ID));
        assert_eq!(reply_id(None), json!(UNKNOWN_ID));
    }
}
