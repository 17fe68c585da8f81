//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::ServerIdentity;

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent sessions.
    pub max_sessions: usize,
    /// Idle seconds after which the sweeper evicts a session.
    pub session_timeout_secs: u64,
    /// Sweeper period in seconds.
    pub heartbeat_interval_secs: u64,
    /// Per-session outbound and inbound queue depth.
    pub send_queue_depth: usize,
    /// Advertised protocol version.
    pub protocol_version: String,
    /// Advertised server name.
    pub name: String,
    /// Advertised server version.
    pub version: String,
}

impl ServerConfig {
    /// Idle timeout as a [`Duration`].
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    /// Sweeper period as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Identity advertised in the handshake reply.
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
            protocol_version: self.protocol_version.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_sessions: 100,
            session_timeout_secs: 300,
            heartbeat_interval_secs: 30,
            send_queue_depth: 256,
            protocol_version: "2024-11-05".into(),
            name: "relay".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
