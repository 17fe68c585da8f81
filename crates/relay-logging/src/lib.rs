//! # relay-logging
//!
//! Structured logging with `tracing`.
//!
//! One global subscriber per process: an [`EnvFilter`](tracing_subscriber::EnvFilter)
//! built from `RUST_LOG` (or the configured level) feeding either a JSON or a
//! human-readable formatter on stderr.

#![deny(unsafe_code)]

pub mod init;
pub mod types;

pub use init::{LoggingError, build_filter, init_logging};
pub use types::LogLevel;
