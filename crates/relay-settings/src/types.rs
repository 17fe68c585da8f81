//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may be partial and missing fields keep their compiled default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Listener, session and protocol settings.
    pub server: ServerSettings,
    /// Downstream API the operation catalog talks to.
    pub downstream: DownstreamSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl RelaySettings {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.server.max_sessions == 0, "server.maxSessions", "must be greater than 0"),
            (self.server.session_timeout_secs == 0, "server.sessionTimeoutSecs", "must be greater than 0"),
            (self.server.heartbeat_interval_secs == 0, "server.heartbeatIntervalSecs", "must be greater than 0"),
            (self.server.name.is_empty(), "server.name", "must not be empty"),
            (self.downstream.base_url.is_empty(), "downstream.baseUrl", "must not be empty"),
        ];
        match checks.into_iter().find(|(failed, ..)| *failed) {
            Some((_, field, reason)) => Err(SettingsError::Invalid { field, reason }),
            None => Ok(()),
        }
    }
}

/// Server network, session and protocol settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` = auto-assign).
    pub port: u16,
    /// Maximum concurrent sessions; admission beyond this is refused.
    pub max_sessions: usize,
    /// Idle time after which the sweeper evicts a session.
    pub session_timeout_secs: u64,
    /// Sweeper period; also the keep-alive cadence.
    pub heartbeat_interval_secs: u64,
    /// Per-session outbound queue depth.
    pub send_queue_depth: usize,
    /// Protocol version advertised in the handshake reply.
    pub protocol_version: String,
    /// Server name advertised in the handshake reply.
    pub name: String,
    /// Server version advertised in the handshake reply.
    pub version: String,
}

impl ServerSettings {
    /// Idle timeout as a [`Duration`].
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    /// Sweeper period as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_sessions: 100,
            session_timeout_secs: 300,
            heartbeat_interval_secs: 30,
            send_queue_depth: 256,
            protocol_version: "2024-11-05".to_string(),
            name: "relay".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Downstream API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownstreamSettings {
    /// Base URL every operation path is appended to.
    pub base_url: String,
    /// Path requested to check a caller's credential.
    pub credential_check_path: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// JSON file declaring the operation catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

impl Default for DownstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            credential_check_path: "/auth/validate".to_string(),
            request_timeout_secs: 30,
            catalog_path: None,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level filter. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
