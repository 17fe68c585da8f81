//! Per-connection session state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use relay_protocol::Frame;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TransportError;

/// Server-to-client half of a connection, as seen by the core.
pub trait PushSink: Send + Sync {
    /// Queue one frame for delivery.
    fn write(&self, frame: Frame) -> Result<(), TransportError>;

    /// Close the channel. Closing twice is not an error.
    fn close(&self) -> Result<(), TransportError>;
}

/// Handshake progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakePhase {
    /// No successful `initialize` yet.
    AwaitingInitialize,
    /// `initialize` answered; waiting for `initialized`.
    AwaitingAck,
    /// Handshake complete.
    Ready,
}

/// Identity a client presents in `initialize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

/// `initialize` arrived after the handshake already completed.
#[derive(Debug, thiserror::Error)]
#[error("session already initialized")]
pub struct AlreadyInitialized;

struct Handshake {
    phase: HandshakePhase,
    peer: Option<PeerInfo>,
    capabilities: Option<Value>,
    protocol_version: Option<String>,
}

/// One logical client connection.
pub struct Session {
    /// Unique session id.
    pub id: String,
    /// When the session was admitted.
    pub connected_at: Instant,
    sink: Arc<dyn PushSink>,
    handshake: Mutex<Handshake>,
    authenticated: AtomicBool,
    last_activity: Mutex<Instant>,
}

impl Session {
    /// New unauthenticated session writing to `sink`.
    pub fn new(id: impl Into<String>, sink: Arc<dyn PushSink>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            connected_at: now,
            sink,
            handshake: Mutex::new(Handshake {
                phase: HandshakePhase::AwaitingInitialize,
                peer: None,
                capabilities: None,
                protocol_version: None,
            }),
            authenticated: AtomicBool::new(false),
            last_activity: Mutex::new(now),
        }
    }

    /// Whether the handshake has completed. Never reverts once `true`.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Current handshake phase.
    pub fn phase(&self) -> HandshakePhase {
        self.handshake.lock().phase
    }

    /// Peer identity recorded by `initialize`.
    pub fn peer(&self) -> Option<PeerInfo> {
        self.handshake.lock().peer.clone()
    }

    /// Client capabilities recorded by `initialize`.
    pub fn client_capabilities(&self) -> Option<Value> {
        self.handshake.lock().capabilities.clone()
    }

    /// Protocol version the client asked for in `initialize`.
    pub fn client_protocol_version(&self) -> Option<String> {
        self.handshake.lock().protocol_version.clone()
    }

    /// Record a successful `initialize`. A repeated `initialize` before the
    /// acknowledgement overwrites the recorded peer.
    pub fn begin_handshake(
        &self,
        peer: PeerInfo,
        capabilities: Option<Value>,
        protocol_version: String,
    ) -> Result<(), AlreadyInitialized> {
        let mut hs = self.handshake.lock();
        if hs.phase == HandshakePhase::Ready {
            return Err(AlreadyInitialized);
        }
        hs.phase = HandshakePhase::AwaitingAck;
        hs.peer = Some(peer);
        hs.capabilities = capabilities;
        hs.protocol_version = Some(protocol_version);
        Ok(())
    }

    /// Apply the client's acknowledgement.
    ///
    /// Returns `false` when no `initialize` has succeeded yet.
    pub fn complete_handshake(&self) -> bool {
        let mut hs = self.handshake.lock();
        match hs.phase {
            HandshakePhase::AwaitingInitialize => false,
            HandshakePhase::AwaitingAck | HandshakePhase::Ready => {
                hs.phase = HandshakePhase::Ready;
                self.authenticated.store(true, Ordering::Release);
                true
            }
        }
    }

    /// Record activity now. `last_activity` never moves backwards.
    pub fn touch(&self) {
        let now = Instant::now();
        let mut last = self.last_activity.lock();
        if now > *last {
            *last = now;
        }
    }

    /// Last recorded activity.
    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    /// Idle time as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity())
    }

    /// Push a frame to the client.
    pub fn push(&self, frame: Frame) -> Result<(), TransportError> {
        self.sink.write(frame)
    }

    pub(crate) fn close(&self) -> Result<(), TransportError> {
        self.sink.close()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
