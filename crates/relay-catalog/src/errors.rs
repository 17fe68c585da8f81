//! Catalog error types.

/// Errors raised by operation and prompt catalogs.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No operation with this name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// No prompt with this name.
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),

    /// Arguments do not satisfy the operation or prompt declaration.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The downstream API could not be reached or answered unexpectedly.
    #[error("downstream unavailable: {0}")]
    Unavailable(String),

    /// The downstream API answered with a non-success status.
    #[error("downstream returned {status}: {message}")]
    Downstream {
        /// HTTP status code.
        status: u16,
        /// Error description extracted from the response body.
        message: String,
    },

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
