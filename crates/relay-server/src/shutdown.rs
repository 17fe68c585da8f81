//! Graceful shutdown: stop the background tasks and close every session.
//!
//! axum's graceful drain waits for open responses to finish, and an SSE
//! response only finishes when its session is closed. Firing the
//! coordinator therefore closes all sessions in the same step as
//! cancelling the token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;

/// How long to wait for the listener and sweeper before aborting them.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Stops the listener and sweeper, and ends every open push stream.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    registry: Arc<SessionRegistry>,
}

impl ShutdownCoordinator {
    /// Coordinator over `registry` that has not fired.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            token: CancellationToken::new(),
            registry,
        }
    }

    /// Token observed by the listener and the sweeper.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the token and close every live session.
    ///
    /// Returns how many sessions were closed by this call. Calling it again
    /// closes only sessions admitted in between.
    pub fn shutdown(&self) -> usize {
        self.token.cancel();
        let sessions = self.registry.all();
        let closed = sessions
            .iter()
            .filter(|session| self.registry.remove(&session.id).is_some())
            .count();
        debug!(closed, "sessions closed for shutdown");
        closed
    }

    /// Whether shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Shut down, then wait up to `timeout` for `handles` to finish.
    ///
    /// Tasks still running after the timeout are aborted.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);
        let closed = self.shutdown();
        info!(
            sessions_closed = closed,
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "draining relay"
        );

        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        if tokio::time::timeout(timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!("drain timed out after {timeout:?}, aborting remaining tasks");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}
