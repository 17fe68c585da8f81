//! Session registry: the one shared table of live sessions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::errors::AdmissionError;
use crate::session::{PushSink, Session};

/// Capacity-limited map from session id to [`Session`].
///
/// Admission, dispatch and the sweeper all go through this table; every
/// mutation happens under the write lock, and [`all`](Self::all) hands out a
/// snapshot so callers never iterate while holding it.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
}

impl SessionRegistry {
    /// Empty registry admitting at most `max_sessions`.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Configured maximum.
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Admit a new session bound to `sink`.
    ///
    /// The capacity check and insert are one atomic step, so concurrent
    /// admissions near the limit cannot overshoot it.
    pub fn admit(
        &self,
        id: impl Into<String>,
        sink: Arc<dyn PushSink>,
    ) -> Result<Arc<Session>, AdmissionError> {
        let id = id.into();
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            warn!(session_id = %id, max = self.max_sessions, "rejecting session, at capacity");
            return Err(AdmissionError::AtCapacity {
                max: self.max_sessions,
            });
        }
        if sessions.contains_key(&id) {
            return Err(AdmissionError::DuplicateId(id));
        }
        let session = Arc::new(Session::new(id.clone(), sink));
        let _ = sessions.insert(id.clone(), session.clone());
        info!(session_id = %id, total = sessions.len(), "session admitted");
        Ok(session)
    }

    /// Look up a session.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session and close its push channel. Idempotent.
    ///
    /// Close failures are logged, never propagated.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.write().remove(id);
        match &removed {
            Some(session) => {
                if let Err(e) = session.close() {
                    warn!(session_id = %id, error = %e, "failed to close push channel");
                }
                info!(
                    session_id = %id,
                    connected_secs = session.connected_at.elapsed().as_secs(),
                    "session removed"
                );
            }
            None => debug!(session_id = %id, "remove: session already gone"),
        }
        removed
    }

    /// Snapshot of every live session.
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Number of sessions that completed the handshake.
    pub fn ready_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_authenticated())
            .count()
    }
}
