//! Declarative operation specs for the HTTP catalog.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::errors::{CatalogError, Result};
use crate::traits::OperationDescriptor;

/// HTTP verb an operation maps to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Arguments go in the query string.
    #[default]
    Get,
    /// Arguments go in a JSON body.
    Post,
    /// Arguments go in a JSON body.
    Put,
    /// Arguments go in the query string.
    Delete,
}

impl HttpMethod {
    /// Whether remaining arguments are sent as a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// The matching `reqwest` verb.
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One downstream operation.
///
/// `path` may contain `{placeholder}` segments; each is filled from the
/// argument of the same name, which is then removed from the bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSpec {
    /// Unique operation name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the accepted arguments.
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    /// HTTP verb.
    #[serde(default)]
    pub method: HttpMethod,
    /// Path relative to the downstream base URL.
    pub path: String,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

impl OperationSpec {
    /// Listing entry for this operation.
    pub fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Fill `{placeholders}` in the path from `arguments`, consuming them.
    pub fn render_path(&self, arguments: &mut Map<String, Value>) -> Result<String> {
        let mut out = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                return Err(CatalogError::InvalidArguments(format!(
                    "unterminated placeholder in path '{}'",
                    self.path
                )));
            };
            let key = &after[..end];
            let value = arguments.remove(key).ok_or_else(|| {
                CatalogError::InvalidArguments(format!(
                    "operation '{}' requires argument '{key}'",
                    self.name
                ))
            })?;
            let text = scalar_text(&value);
            // Dot segments would be resolved by the URL parser and leave the template.
            if text == "." || text == ".." {
                return Err(CatalogError::InvalidArguments(format!(
                    "argument '{key}' of operation '{}' must not be a dot segment",
                    self.name
                )));
            }
            out.extend(utf8_percent_encode(&text, PATH_SEGMENT));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        if !out.starts_with('/') {
            out.insert(0, '/');
        }
        Ok(out)
    }
}

/// Text form of an argument value: strings unquoted, everything else as JSON.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Everything outside the unreserved set is encoded inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
