//! Downstream operation catalog backed by `reqwest`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use relay_settings::DownstreamSettings;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{CatalogError, Result};
use crate::operation::{OperationSpec, scalar_text};
use crate::traits::{OperationCatalog, OperationDescriptor};

/// Longest downstream error body echoed back in a [`CatalogError::Downstream`].
const MAX_ERROR_BODY: usize = 512;

/// Operation catalog that maps each [`OperationSpec`] onto an HTTP call.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    credential_check_path: String,
    operations: Vec<OperationSpec>,
    index: HashMap<String, usize>,
}

impl HttpCatalog {
    /// Build a catalog talking to `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        credential_check_path: impl Into<String>,
        timeout: Duration,
        operations: Vec<OperationSpec>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let index = operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.name.clone(), i))
            .collect();
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential_check_path: credential_check_path.into(),
            operations,
            index,
        })
    }

    /// Build from downstream settings.
    pub fn from_settings(
        settings: &DownstreamSettings,
        operations: Vec<OperationSpec>,
    ) -> Result<Self> {
        Self::new(
            settings.base_url.clone(),
            settings.credential_check_path.clone(),
            Duration::from_secs(settings.request_timeout_secs),
            operations,
        )
    }

    fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.index.get(name).and_then(|&i| self.operations.get(i))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[async_trait]
impl OperationCatalog for HttpCatalog {
    async fn list(&self) -> Vec<OperationDescriptor> {
        self.operations.iter().map(OperationSpec::descriptor).collect()
    }

    async fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    async fn validate_credential(&self, credential: &str) -> Result<bool> {
        let url = self.url(&self.credential_check_path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("credential check failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(%status, "credential rejected by downstream");
            Ok(false)
        } else {
            warn!(%status, %url, "unexpected credential check status");
            Err(CatalogError::Unavailable(format!(
                "credential check returned {status}"
            )))
        }
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
        credential: &str,
    ) -> Result<Value> {
        let spec = self
            .operation(name)
            .ok_or_else(|| CatalogError::UnknownOperation(name.to_string()))?;

        let mut arguments = arguments;
        let path = spec.render_path(&mut arguments)?;
        let url = self.url(&path);
        debug!(operation = name, method = %spec.method, %url, "invoking downstream operation");

        let builder = self.client.request(spec.method.as_reqwest(), &url);
        let request = if spec.method.has_body() {
            builder.json(&Value::Object(arguments))
        } else {
            builder.query(&query_pairs(&arguments))
        };

        let response = request.bearer_auth(credential).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Downstream {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn query_pairs(arguments: &Map<String, Value>) -> Vec<(String, String)> {
    arguments
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), scalar_text(v)))
        .collect()
}

/// Prefer a `message` or `error` string from a JSON body, else the raw text.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                return s.clone();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}
