//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating relay settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The settings file is not valid JSON.
    #[error("failed to parse settings file {}: {source}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The merged settings do not fit the expected shape (e.g. a string port).
    #[error("settings have the wrong shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// A field holds a value the relay cannot run with.
    #[error("invalid settings value {field}: {reason}")]
    Invalid {
        /// Dotted camelCase path, as written in the settings file.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl SettingsError {
    /// Settings field an [`Invalid`](Self::Invalid) error refers to.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
