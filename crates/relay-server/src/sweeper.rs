//! Liveness sweeper: idle eviction plus keep-alive pushes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_protocol::{Notification, OutboundEnvelope, codec};
use serde_json::json;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry::SessionRegistry;

/// Event tag for keep-alive pushes.
pub const HEARTBEAT_EVENT: &str = "heartbeat";

/// Method name of the keep-alive notification.
pub const HEARTBEAT_METHOD: &str = "notifications/heartbeat";

/// What one sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions removed, either idle too long or unwritable.
    pub evicted: Vec<String>,
    /// Sessions that received a keep-alive.
    pub pinged: usize,
}

/// Run one sweep as of `now`.
///
/// Sessions idle longer than `timeout` are removed; every other session gets
/// a keep-alive. A keep-alive that cannot be written also removes the
/// session. Keep-alives are not activity: `last_activity` is only read here.
pub fn sweep_at(registry: &SessionRegistry, now: Instant, timeout: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    for session in registry.all() {
        let idle = session.idle_for(now);
        if idle > timeout {
            info!(session_id = %session.id, idle_secs = idle.as_secs(), "evicting idle session");
            let _ = registry.remove(&session.id);
            report.evicted.push(session.id.clone());
            continue;
        }

        let heartbeat = Notification::new(
            HEARTBEAT_METHOD,
            Some(json!({ "timestamp": chrono::Utc::now().to_rfc3339() })),
        );
        let frame = match codec::encode(&OutboundEnvelope::from(heartbeat), Some(HEARTBEAT_EVENT)) {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, "failed to encode heartbeat");
                continue;
            }
        };
        match session.push(frame) {
            Ok(()) => report.pinged += 1,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "heartbeat push failed, removing session");
                let _ = registry.remove(&session.id);
                report.evicted.push(session.id.clone());
            }
        }
    }

    report
}

/// Sweep every `interval` until `cancel` fires.
///
/// The first sweep happens one full interval after start.
pub async fn run_sweeper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = sweep_at(&registry, Instant::now(), timeout);
                debug!(
                    evicted = report.evicted.len(),
                    pinged = report.pinged,
                    "sweep complete"
                );
            }
            () = cancel.cancelled() => {
                debug!("sweeper cancelled");
                return;
            }
        }
    }
}
