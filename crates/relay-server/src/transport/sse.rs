//! Server-sent events push channel with per-session submission lanes.
//!
//! `GET /sse` opens a push stream and admits a session; the first frame
//! is an `endpoint` event naming the URL to `POST` envelopes to. Each
//! session owns one bounded inbound lane drained by one worker task, so a
//! session's envelopes are dispatched in arrival order while sessions
//! proceed independently.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use relay_protocol::Frame;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::errors::{AdmissionError, TransportError};
use crate::registry::SessionRegistry;
use crate::session::PushSink;

/// Event tag of the first frame on every stream.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Push half of one SSE connection.
pub struct SseSink {
    tx: mpsc::Sender<Frame>,
    closed: CancellationToken,
}

impl SseSink {
    /// Sink feeding `tx`; closing cancels `closed`.
    pub fn new(tx: mpsc::Sender<Frame>, closed: CancellationToken) -> Self {
        Self { tx, closed }
    }
}

impl PushSink for SseSink {
    fn write(&self, frame: Frame) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    fn close(&self) -> Result<(), TransportError> {
        self.closed.cancel();
        Ok(())
    }
}

/// SSE adapter between axum and the protocol core.
pub struct SseTransport {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<Dispatcher>,
    inboxes: DashMap<String, mpsc::Sender<String>>,
    queue_depth: usize,
}

impl SseTransport {
    /// Adapter over `registry`, routing inbound text to `dispatcher`.
    pub fn new(
        registry: Arc<SessionRegistry>,
        dispatcher: Arc<Dispatcher>,
        queue_depth: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            inboxes: DashMap::new(),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Admit a new session and open its lanes.
    ///
    /// Must be called from within a tokio runtime; the inbound worker is
    /// spawned here.
    pub fn connect(self: &Arc<Self>) -> Result<SseConnection, AdmissionError> {
        let session_id = uuid::Uuid::now_v7().to_string();
        let (frame_tx, frame_rx) = mpsc::channel(self.queue_depth);
        let closed = CancellationToken::new();
        let sink = Arc::new(SseSink::new(frame_tx, closed.clone()));

        let session = self.registry.admit(session_id.clone(), sink)?;
        // Fresh channel: cannot be full or closed yet.
        let _ = session.push(Frame::new(
            Some(ENDPOINT_EVENT),
            format!("/message?sessionId={session_id}"),
        ));

        let (inbound_tx, inbound_rx) = mpsc::channel(self.queue_depth);
        let _ = self.inboxes.insert(session_id.clone(), inbound_tx);
        drop(tokio::spawn(run_inbound_lane(
            self.dispatcher.clone(),
            session_id.clone(),
            inbound_rx,
            closed.clone(),
        )));

        info!(session_id = %session_id, "SSE stream opened");
        Ok(SseConnection {
            session_id: session_id.clone(),
            frames: frame_rx,
            closed,
            guard: DisconnectGuard {
                transport: Arc::clone(self),
                session_id,
            },
        })
    }

    /// Queue raw envelope text on a session's inbound lane.
    ///
    /// Waits for lane capacity rather than dropping.
    pub async fn submit(&self, session_id: &str, raw: String) -> Result<(), TransportError> {
        if self.registry.get(session_id).is_none() {
            return Err(TransportError::UnknownSession(session_id.to_string()));
        }
        let lane = self
            .inboxes
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TransportError::UnknownSession(session_id.to_string()))?;
        lane.send(raw)
            .await
            .map_err(|_| TransportError::UnknownSession(session_id.to_string()))
    }

    /// Number of open inbound lanes.
    pub fn lane_count(&self) -> usize {
        self.inboxes.len()
    }

    fn disconnect(&self, session_id: &str) {
        let _ = self.inboxes.remove(session_id);
        let _ = self.registry.remove(session_id);
        info!(session_id = %session_id, "SSE stream closed");
    }
}

/// One open push stream. Dropping it removes the session.
pub struct SseConnection {
    /// Id of the admitted session.
    pub session_id: String,
    frames: mpsc::Receiver<Frame>,
    closed: CancellationToken,
    guard: DisconnectGuard,
}

impl SseConnection {
    /// Rendered event-stream records; ends when the session is closed.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
        let guard = self.guard;
        ReceiverStream::new(self.frames)
            .take_until(self.closed.cancelled_owned())
            .map(move |frame| {
                let _ = &guard;
                Ok(frame.render())
            })
    }
}

impl IntoResponse for SseConnection {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(self.into_stream()),
        )
            .into_response()
    }
}

struct DisconnectGuard {
    transport: Arc<SseTransport>,
    session_id: String,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.transport.disconnect(&self.session_id);
    }
}

async fn run_inbound_lane(
    dispatcher: Arc<Dispatcher>,
    session_id: String,
    mut inbound: mpsc::Receiver<String>,
    closed: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = closed.cancelled() => break,
            next = inbound.recv() => match next {
                Some(raw) => {
                    let _ = dispatcher.handle_message(&session_id, &raw).await;
                }
                None => break,
            },
        }
    }
    debug!(session_id = %session_id, "inbound lane stopped");
}
