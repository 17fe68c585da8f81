//! Parameter extraction helpers.

use relay_protocol::RpcError;
use serde_json::{Map, Value};

/// Required non-empty string parameter.
pub fn require_string_param(params: Option<&Value>, key: &str) -> Result<String, RpcError> {
    match params.and_then(|p| p.get(key)) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(RpcError::invalid_params(format!(
            "Parameter '{key}' must not be empty"
        ))),
        Some(Value::Null) | None => Err(RpcError::invalid_params(format!(
            "Missing required parameter '{key}'"
        ))),
        Some(_) => Err(RpcError::invalid_params(format!(
            "Parameter '{key}' must be a string"
        ))),
    }
}

/// Optional object parameter; absent or `null` yields an empty map.
pub fn optional_object_param(
    params: Option<&Value>,
    key: &str,
) -> Result<Map<String, Value>, RpcError> {
    match params.and_then(|p| p.get(key)) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(RpcError::invalid_params(format!(
            "Parameter '{key}' must be an object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_protocol::ErrorCode;
    use serde_json::json;

    #[test]
    fn string_present() {
        let p = json!({"name": "get_user"});
        assert_eq!(require_string_param(Some(&p), "name").unwrap(), "get_user");
    }

    #[test]
    fn string_missing() {
        let p = json!({});
        let err = require_string_param(Some(&p), "name").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
        assert!(err.to_string().contains("'name'"));
        assert!(require_string_param(None, "name").is_err());
    }

    #[test]
    fn string_wrong_type_or_empty() {
        let p = json!({"name": 3, "uri": ""});
        assert!(require_string_param(Some(&p), "name").is_err());
        assert!(require_string_param(Some(&p), "uri").is_err());
    }

    #[test]
    fn object_defaults_to_empty() {
        assert!(optional_object_param(None, "arguments").unwrap().is_empty());
        let p = json!({"arguments": null});
        assert!(optional_object_param(Some(&p), "arguments").unwrap().is_empty());
    }

    #[test]
    fn object_wrong_type() {
        let p = json!({"arguments": [1]});
        let err = optional_object_param(Some(&p), "arguments").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
    }
}
