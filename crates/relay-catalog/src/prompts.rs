//! In-memory prompt catalog with `{{argument}}` templates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CatalogError, Result};
use crate::operation::scalar_text;
use crate::traits::{
    PromptArgument, PromptCatalog, PromptContent, PromptDescriptor, PromptMessage, PromptResult,
};

/// One prompt: its listing entry plus the template rendered as a single
/// user message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
    /// Message text; `{{name}}` is replaced by the argument value.
    pub template: String,
}

impl PromptTemplate {
    fn descriptor(&self) -> PromptDescriptor {
        PromptDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
        }
    }

    fn render(&self, arguments: &Map<String, Value>) -> Result<String> {
        for arg in self.arguments.iter().filter(|a| a.required) {
            if !arguments.contains_key(&arg.name) {
                return Err(CatalogError::InvalidArguments(format!(
                    "prompt '{}' requires argument '{}'",
                    self.name, arg.name
                )));
            }
        }

        // One pass over the template: substituted text is never rescanned.
        let mut text = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("{{") {
            text.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                text.push_str(&rest[start..]);
                return Ok(text);
            };
            let key = &after[..end];
            if self.arguments.iter().any(|a| a.name == key) {
                if let Some(value) = arguments.get(key) {
                    text.push_str(&scalar_text(value));
                }
            } else {
                text.push_str(&rest[start..start + 2 + end + 2]);
            }
            rest = &after[end + 2..];
        }
        text.push_str(rest);
        Ok(text)
    }
}

/// Prompt catalog backed by a fixed list of templates.
#[derive(Clone, Debug, Default)]
pub struct StaticPrompts {
    templates: Vec<PromptTemplate>,
}

impl StaticPrompts {
    /// Catalog serving exactly `templates`, in order.
    pub fn new(templates: Vec<PromptTemplate>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl PromptCatalog for StaticPrompts {
    async fn list_prompts(&self) -> Vec<PromptDescriptor> {
        self.templates.iter().map(PromptTemplate::descriptor).collect()
    }

    async fn get_prompt(&self, name: &str, arguments: &Map<String, Value>) -> Result<PromptResult> {
        let template = self
            .templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CatalogError::UnknownPrompt(name.to_string()))?;
        let text = template.render(arguments)?;
        Ok(PromptResult {
            description: template.description.clone(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: PromptContent::Text { text },
            }],
        })
    }
}
