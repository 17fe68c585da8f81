//! Error-code registry and the handler error type.

use crate::envelope::ErrorObject;

// ── Error code registry ─────────────────────────────────────────────

/// Stable integer error codes carried in `error.code`.
///
/// Values are part of the wire contract. New codes may be appended; existing
/// ones are never renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Inbound text was not well-formed JSON.
    ParseError,
    /// Well-formed JSON that is not a valid envelope.
    InvalidRequest,
    /// Method name not in the dispatch table.
    MethodNotFound,
    /// Required parameter missing or of the wrong type.
    InvalidParams,
    /// Unexpected failure inside the server.
    InternalError,
    /// Tool name not present in the operation catalog.
    InvalidTool,
    /// Malformed resource reference.
    InvalidResource,
    /// Prompt name not present in the prompt catalog.
    InvalidPrompt,
    /// Resource does not exist.
    ResourceNotFound,
    /// Tool execution failed at the protocol level.
    ToolExecutionError,
    /// Handshake incomplete, or credential missing or rejected.
    AuthenticationError,
    /// Authenticated but not permitted.
    AuthorizationError,
    /// Too many requests.
    RateLimited,
    /// Operation exceeded its deadline.
    Timeout,
}

impl ErrorCode {
    /// Every registered code, in registry order.
    pub const ALL: [Self; 14] = [
        Self::ParseError,
        Self::InvalidRequest,
        Self::MethodNotFound,
        Self::InvalidParams,
        Self::InternalError,
        Self::InvalidTool,
        Self::InvalidResource,
        Self::InvalidPrompt,
        Self::ResourceNotFound,
        Self::ToolExecutionError,
        Self::AuthenticationError,
        Self::AuthorizationError,
        Self::RateLimited,
        Self::Timeout,
    ];

    /// Wire value.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::InvalidTool => -32000,
            Self::InvalidResource => -32001,
            Self::InvalidPrompt => -32002,
            Self::ResourceNotFound => -32003,
            Self::ToolExecutionError => -32004,
            Self::AuthenticationError => -32005,
            Self::AuthorizationError => -32006,
            Self::RateLimited => -32007,
            Self::Timeout => -32008,
        }
    }

    /// Reverse lookup of a wire value.
    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }

    /// Symbolic name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::MethodNotFound => "METHOD_NOT_FOUND",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::InternalError => "INTERNAL_ERROR",
            Self::InvalidTool => "INVALID_TOOL",
            Self::InvalidResource => "INVALID_RESOURCE",
            Self::InvalidPrompt => "INVALID_PROMPT",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ToolExecutionError => "TOOL_EXECUTION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::AuthorizationError => "AUTHORIZATION_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Handler error ───────────────────────────────────────────────────

/// Envelope-level error produced while handling a message.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Inbound text could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },

    /// Envelope failed shape validation.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What is wrong with the envelope.
        message: String,
    },

    /// Method name is not dispatchable.
    #[error("Method not found: {method}")]
    MethodNotFound {
        /// The offending method name.
        method: String,
    },

    /// Required parameter missing or wrong type.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },

    /// Unknown tool.
    #[error("Unknown tool: {name}")]
    InvalidTool {
        /// Requested tool name.
        name: String,
    },

    /// Unknown prompt.
    #[error("Unknown prompt: {name}")]
    InvalidPrompt {
        /// Requested prompt name.
        name: String,
    },

    /// Resource does not exist.
    #[error("Resource not found: {uri}")]
    ResourceNotFound {
        /// Requested resource URI.
        uri: String,
    },

    /// Handshake not complete, or credential missing / rejected.
    #[error("{message}")]
    Authentication {
        /// Human-readable reason.
        message: String,
    },

    /// Any other registered code.
    #[error("{message}")]
    Custom {
        /// Registered code.
        code: ErrorCode,
        /// Human-readable message.
        message: String,
        /// Optional structured details.
        data: Option<serde_json::Value>,
    },
}

impl RpcError {
    /// Shorthand for [`RpcError::InvalidParams`].
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Shorthand for [`RpcError::Authentication`].
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Shorthand for [`RpcError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Registered code for this variant.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::Internal { .. } => ErrorCode::InternalError,
            Self::InvalidTool { .. } => ErrorCode::InvalidTool,
            Self::InvalidPrompt { .. } => ErrorCode::InvalidPrompt,
            Self::ResourceNotFound { .. } => ErrorCode::ResourceNotFound,
            Self::Authentication { .. } => ErrorCode::AuthenticationError,
            Self::Custom { code, .. } => *code,
        }
    }

    /// Convert to the wire-format error object.
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code().as_i32(),
            message: self.to_string(),
            data: match self {
                Self::Custom { data, .. } => data.clone(),
                _ => None,
            },
        }
    }
}
