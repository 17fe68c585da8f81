//! JSON catalog file: operations and prompts declared side by side.
//!
//! ```json
//! {
//!   "operations": [
//!     { "name": "get_user", "method": "GET", "path": "/users/{id}",
//!       "description": "Fetch a user", "inputSchema": { "type": "object" } }
//!   ],
//!   "prompts": [
//!     { "name": "summarize", "template": "Summarize {{record}}",
//!       "arguments": [{ "name": "record", "required": true }] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CatalogError, Result};
use crate::operation::OperationSpec;
use crate::prompts::PromptTemplate;

/// Parsed catalog file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    /// Downstream operations.
    pub operations: Vec<OperationSpec>,
    /// Prompt templates.
    pub prompts: Vec<PromptTemplate>,
}

impl CatalogFile {
    /// Read and validate a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "loading catalog file");
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate catalog JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(content)?;
        file.check_unique()?;
        Ok(file)
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for op in &self.operations {
            if !seen.insert(op.name.as_str()) {
                return Err(CatalogError::InvalidArguments(format!(
                    "duplicate operation name '{}'",
                    op.name
                )));
            }
        }
        seen.clear();
        for prompt in &self.prompts {
            if !seen.insert(prompt.name.as_str()) {
                return Err(CatalogError::InvalidArguments(format!(
                    "duplicate prompt name '{}'",
                    prompt.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "operations": [
            {"name": "get_user", "method": "GET", "path": "/users/{id}"},
            {"name": "create_user", "method": "POST", "path": "/users"}
        ],
        "prompts": [
            {"name": "summarize", "template": "Summarize {{record}}",
             "arguments": [{"name": "record", "required": true}]}
        ]
    }"#;

    #[test]
    fn parses_operations_and_prompts() {
        let file = CatalogFile::from_json(SAMPLE).unwrap();
        assert_eq!(file.operations.len(), 2);
        assert_eq!(file.operations[1].name, "create_user");
        assert_eq!(file.prompts[0].arguments[0].name, "record");
    }

    #[test]
    fn sections_are_optional() {
        let file = CatalogFile::from_json("{}").unwrap();
        assert!(file.operations.is_empty());
        assert!(file.prompts.is_empty());
    }

    #[test]
    fn duplicate_operation_rejected() {
        let json = r#"{"operations":[{"name":"a","path":"/a"},{"name":"a","path":"/b"}]}"#;
        let err = CatalogFile::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate operation"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let file = CatalogFile::load(&path).unwrap();
        assert_eq!(file.operations[0].path, "/users/{id}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogFile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
