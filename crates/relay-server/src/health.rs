//! `/health` endpoint: session counts read straight from the registry.

use std::time::Instant;

use serde::Serialize;

use crate::registry::SessionRegistry;

/// Whether the relay is taking new sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Admitting sessions.
    Ok,
    /// At `max_sessions`; `GET /sse` answers 503 until one leaves.
    Full,
    /// Shutdown has started.
    Draining,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Admission state.
    pub status: HealthStatus,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Live sessions, ready or not.
    pub connections: usize,
    /// Sessions that completed the handshake.
    pub ready_sessions: usize,
    /// Configured session ceiling.
    pub max_sessions: usize,
}

/// Snapshot the registry into a health response.
pub fn health_check(
    registry: &SessionRegistry,
    start_time: Instant,
    draining: bool,
) -> HealthResponse {
    let connections = registry.len();
    let max_sessions = registry.max_sessions();
    let status = if draining {
        HealthStatus::Draining
    } else if connections >= max_sessions {
        HealthStatus::Full
    } else {
        HealthStatus::Ok
    };
    HealthResponse {
        status,
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
        ready_sessions: registry.ready_count(),
        max_sessions,
    }
}
