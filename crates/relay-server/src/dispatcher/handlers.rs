//! Per-method handlers.

use relay_catalog::CatalogError;
use relay_protocol::RpcError;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::Dispatcher;
use super::params::{optional_object_param, require_string_param};
use crate::session::{PeerInfo, Session};

/// Argument that carries the caller's downstream credential.
pub(super) const CREDENTIAL_FIELD: &str = "apiKey";

impl Dispatcher {
    pub(super) fn initialize(
        &self,
        session: &Session,
        params: Option<&Value>,
    ) -> Result<Value, RpcError> {
        let protocol_version = require_string_param(params, "protocolVersion")?;
        let client_info = params
            .and_then(|p| p.get("clientInfo"))
            .ok_or_else(|| RpcError::invalid_params("Missing required parameter 'clientInfo'"))?;
        let peer: PeerInfo = serde_json::from_value(client_info.clone()).map_err(|_| {
            RpcError::invalid_params("Parameter 'clientInfo' must carry string 'name' and 'version'")
        })?;
        let capabilities = match params.and_then(|p| p.get("capabilities")) {
            None | Some(Value::Null) => None,
            Some(v @ Value::Object(_)) => Some(v.clone()),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "Parameter 'capabilities' must be an object",
                ));
            }
        };

        session
            .begin_handshake(peer.clone(), capabilities, protocol_version.clone())
            .map_err(|e| RpcError::InvalidRequest {
                message: e.to_string(),
            })?;
        info!(
            client = %peer.name,
            client_version = %peer.version,
            requested_version = %protocol_version,
            "initialize accepted"
        );

        Ok(json!({
            "protocolVersion": self.identity.protocol_version,
            "capabilities": server_capabilities(),
            "serverInfo": {
                "name": self.identity.name,
                "version": self.identity.version,
            },
        }))
    }

    pub(super) fn initialized(&self, session: &Session) -> Result<(), RpcError> {
        if session.complete_handshake() {
            info!("session ready");
            Ok(())
        } else {
            Err(RpcError::authentication(
                "initialize must complete before initialized",
            ))
        }
    }

    pub(super) async fn tools_list(&self) -> Value {
        json!({ "tools": self.operations.list().await })
    }

    /// Check order: name, catalog membership, credential presence,
    /// credential validity, then invoke.
    pub(super) async fn tools_call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let name = require_string_param(params, "name")?;
        let mut arguments = optional_object_param(params, "arguments")?;
        // Anonymous callers learn nothing about which tools exist.
        let credential = match arguments.remove(CREDENTIAL_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(RpcError::authentication("Missing API key")),
        };
        if !self.operations.contains(&name).await {
            return Err(RpcError::InvalidTool { name });
        }

        match self.operations.validate_credential(&credential).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(tool = %name, "credential rejected");
                return Err(RpcError::authentication("Invalid API key"));
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "credential check failed");
                return Err(RpcError::authentication(format!(
                    "Unable to validate API key: {e}"
                )));
            }
        }

        match self.operations.invoke(&name, arguments, &credential).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                Ok(tool_result(text, false))
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "operation failed");
                Ok(tool_result(format!("Error: {e}"), true))
            }
        }
    }

    pub(super) async fn prompts_list(&self) -> Value {
        json!({ "prompts": self.prompts.list_prompts().await })
    }

    pub(super) async fn prompts_get(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let name = require_string_param(params, "name")?;
        let arguments = optional_object_param(params, "arguments")?;
        match self.prompts.get_prompt(&name, &arguments).await {
            Ok(result) => serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string())),
            Err(CatalogError::UnknownPrompt(_)) => Err(RpcError::InvalidPrompt { name }),
            Err(CatalogError::InvalidArguments(message)) => Err(RpcError::InvalidParams { message }),
            Err(e) => Err(RpcError::internal(e.to_string())),
        }
    }
}

pub(super) fn ping() -> Value {
    json!({ "timestamp": chrono::Utc::now().to_rfc3339() })
}

// Resources are not backed by anything yet: listing is always empty and
// every read is not-found.
pub(super) fn resources_list() -> Value {
    json!({ "resources": [] })
}

pub(super) fn resources_read(params: Option<&Value>) -> Result<Value, RpcError> {
    let uri = require_string_param(params, "uri")?;
    Err(RpcError::ResourceNotFound { uri })
}

fn server_capabilities() -> Value {
    json!({
        "tools": { "listChanged": true },
        "resources": { "subscribe": false, "listChanged": true },
        "prompts": { "listChanged": true },
    })
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}
