//! Decode, validate and encode envelopes. Pure functions, no I/O.

use serde_json::Value;

use crate::envelope::{
    Envelope, ErrorObject, Notification, OutboundEnvelope, RawEnvelope, Request, Response,
    PROTOCOL_TAG,
};
use crate::errors::RpcError;
use crate::frame::Frame;

/// Codec failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text is not well-formed JSON.
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON is well-formed but not a valid envelope.
    #[error("{0}")]
    Invalid(String),

    /// Outbound envelope could not be serialized.
    #[error("failed to serialize envelope: {0}")]
    Serialize(serde_json::Error),
}

impl CodecError {
    /// Envelope-level error to report back to the client.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Parse(e) => RpcError::Parse {
                message: e.to_string(),
            },
            Self::Invalid(message) => RpcError::InvalidRequest {
                message: message.clone(),
            },
            Self::Serialize(e) => RpcError::internal(e.to_string()),
        }
    }
}

/// Parse raw text into a [`RawEnvelope`].
///
/// Fails only when the text is not well-formed JSON. Non-object JSON decodes
/// to an empty envelope that [`validate`] will reject.
pub fn decode(raw: &str) -> Result<RawEnvelope, CodecError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut map) = value else {
        return Ok(RawEnvelope::default());
    };
    Ok(RawEnvelope {
        jsonrpc: map.remove("jsonrpc"),
        id: map.remove("id"),
        method: map.remove("method"),
        params: map.remove("params"),
        result: map.remove("result"),
        error: map.remove("error"),
        is_object: true,
    })
}

/// Classify a decoded envelope.
///
/// Valid iff the protocol tag is correct and the envelope has a non-empty
/// `method`, a `result`, or an `error`.
pub fn validate(raw: RawEnvelope) -> Result<Envelope, CodecError> {
    if !raw.is_object {
        return Err(CodecError::Invalid("envelope must be a JSON object".into()));
    }
    match raw.jsonrpc.as_ref().and_then(Value::as_str) {
        Some(PROTOCOL_TAG) => {}
        _ => {
            return Err(CodecError::Invalid(format!(
                "jsonrpc field must be \"{PROTOCOL_TAG}\""
            )));
        }
    }

    let id = raw.id.filter(|v| !v.is_null());

    if let Some(method) = raw.method {
        let method = match method {
            Value::String(s) if !s.is_empty() => s,
            _ => return Err(CodecError::Invalid("method must be a non-empty string".into())),
        };
        let params = raw.params.filter(|v| !v.is_null());
        return Ok(match id {
            Some(id) => Envelope::Request(Request { id, method, params }),
            None => Envelope::Notification(Notification::new(method, params)),
        });
    }

    match (raw.result, raw.error) {
        (Some(_), Some(_)) => Err(CodecError::Invalid(
            "response must carry exactly one of result or error".into(),
        )),
        (Some(result), None) => Ok(Envelope::Response(Response {
            jsonrpc: PROTOCOL_TAG.to_owned(),
            id,
            result: Some(result),
            error: None,
        })),
        (None, Some(error)) => {
            let error: ErrorObject = serde_json::from_value(error)
                .map_err(|e| CodecError::Invalid(format!("malformed error object: {e}")))?;
            Ok(Envelope::Response(Response {
                jsonrpc: PROTOCOL_TAG.to_owned(),
                id,
                result: None,
                error: Some(error),
            }))
        }
        (None, None) => Err(CodecError::Invalid(
            "envelope must carry a method, a result or an error".into(),
        )),
    }
}

/// Serialize an outbound envelope into a push frame with a fresh id.
pub fn encode(envelope: &OutboundEnvelope, event: Option<&str>) -> Result<Frame, CodecError> {
    let data = serde_json::to_string(envelope).map_err(CodecError::Serialize)?;
    Ok(Frame::new(event, data))
}
