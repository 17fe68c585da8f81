//! Transport and admission errors.

/// Failure writing to or closing a session's push channel.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The push channel is closed (client gone or session removed).
    #[error("push channel closed")]
    Closed,
    /// The push channel's buffer is full.
    #[error("push channel full")]
    Full,
    /// No live session with this id.
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Why a new session was not admitted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The registry already holds the configured maximum.
    #[error("too many connections (max {max})")]
    AtCapacity {
        /// Configured maximum.
        max: usize,
    },
    /// A session with this id already exists.
    #[error("duplicate session id: {0}")]
    DuplicateId(String),
}
