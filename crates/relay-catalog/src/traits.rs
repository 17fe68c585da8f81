//! Collaborator traits and the descriptor types they exchange.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Listing entry for one operation, as shown to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// Unique operation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema of the accepted arguments.
    pub input_schema: Value,
}

/// Named units of work against a downstream API.
///
/// `invoke` performs network I/O and may take arbitrarily long; callers must
/// not hold session state across it.
#[async_trait]
pub trait OperationCatalog: Send + Sync {
    /// All operations, in declaration order.
    async fn list(&self) -> Vec<OperationDescriptor>;

    /// Whether an operation with this name exists.
    async fn contains(&self, name: &str) -> bool;

    /// Check a caller's credential against the downstream API.
    ///
    /// `Ok(true)` accepted, `Ok(false)` rejected, `Err` when the check itself
    /// could not be completed.
    async fn validate_credential(&self, credential: &str) -> Result<bool>;

    /// Run the named operation on behalf of `credential`.
    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
        credential: &str,
    ) -> Result<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

/// One declared prompt argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name, referenced as `{{name}}` in templates.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether `get_prompt` fails without it.
    #[serde(default)]
    pub required: bool,
}

/// Listing entry for one prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// Content block of a prompt message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    /// Plain text.
    Text {
        /// Rendered text.
        text: String,
    },
}

/// One message of a rendered prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Message body.
    pub content: PromptContent,
}

/// A rendered prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResult {
    /// Description of the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered messages.
    pub messages: Vec<PromptMessage>,
}

/// Named prompt templates.
#[async_trait]
pub trait PromptCatalog: Send + Sync {
    /// All prompts, in declaration order.
    async fn list_prompts(&self) -> Vec<PromptDescriptor>;

    /// Render the named prompt with `arguments`.
    ///
    /// Fails with [`CatalogError::UnknownPrompt`](crate::CatalogError::UnknownPrompt)
    /// when no such prompt exists.
    async fn get_prompt(&self, name: &str, arguments: &Map<String, Value>) -> Result<PromptResult>;
}
