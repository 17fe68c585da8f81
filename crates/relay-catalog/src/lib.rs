//! # relay-catalog
//!
//! Collaborators the relay's dispatcher calls into:
//!
//! - [`OperationCatalog`]: named units of work against a downstream API
//!   (list, credential check, invoke). [`HttpCatalog`] is the `reqwest`-backed
//!   implementation driven by declarative [`OperationSpec`]s.
//! - [`PromptCatalog`]: named prompt templates. [`StaticPrompts`] keeps them
//!   in memory.
//!
//! Both can be populated from a single JSON [`CatalogFile`].

#![deny(unsafe_code)]

pub mod errors;
pub mod file;
pub mod http;
pub mod operation;
pub mod prompts;
pub mod traits;

pub use errors::{CatalogError, Result};
pub use file::CatalogFile;
pub use http::HttpCatalog;
pub use operation::{HttpMethod, OperationSpec};
pub use prompts::{PromptTemplate, StaticPrompts};
pub use traits::{
    OperationCatalog, OperationDescriptor, PromptArgument, PromptCatalog, PromptContent,
    PromptDescriptor, PromptMessage, PromptResult,
};
