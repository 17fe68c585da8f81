//! Protocol dispatcher.
//!
//! Turns one inbound text message into at most one pushed response:
//! decode, validate, gate on handshake state, route by [`Method`], encode,
//! push. Every failure below the transport becomes an error envelope; the
//! session is only torn down when the push itself fails.

mod handlers;
pub mod method;
pub mod params;

use std::sync::Arc;

use futures::FutureExt;
use relay_catalog::{OperationCatalog, PromptCatalog};
use relay_protocol::{Envelope, OutboundEnvelope, Response, RpcError, codec, reply_id};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

pub use method::Method;

use crate::registry::SessionRegistry;
use crate::session::Session;

/// Event tag for pushed responses.
pub const MESSAGE_EVENT: &str = "message";

/// Name, version and protocol version advertised in the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerIdentity {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Protocol version.
    pub protocol_version: String,
}

/// Routes inbound envelopes for every session.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    operations: Arc<dyn OperationCatalog>,
    prompts: Arc<dyn PromptCatalog>,
    identity: ServerIdentity,
}

impl Dispatcher {
    /// Build a dispatcher over `registry`.
    pub fn new(
        registry: Arc<SessionRegistry>,
        operations: Arc<dyn OperationCatalog>,
        prompts: Arc<dyn PromptCatalog>,
        identity: ServerIdentity,
    ) -> Self {
        Self {
            registry,
            operations,
            prompts,
            identity,
        }
    }

    /// Handle one raw inbound message for `session_id`.
    ///
    /// The response (if any) is pushed to the session and also returned.
    /// Messages for unknown sessions are dropped.
    #[instrument(skip_all, fields(session_id = %session_id, method))]
    pub async fn handle_message(&self, session_id: &str, raw: &str) -> Option<Response> {
        let Some(session) = self.registry.get(session_id) else {
            warn!("message for unknown session dropped");
            return None;
        };
        session.touch();

        let response = self.respond(&session, raw).await?;
        self.push(&session, &response);
        Some(response)
    }

    async fn respond(&self, session: &Session, raw: &str) -> Option<Response> {
        let decoded = match codec::decode(raw) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(Response::error(None, &e.to_rpc_error()));
            }
        };
        let raw_id = decoded.id.clone();

        let envelope = match codec::validate(decoded) {
            Ok(env) => env,
            Err(e) => {
                warn!(error = %e, "invalid envelope");
                return Some(Response::error(
                    Some(reply_id(raw_id.as_ref())),
                    &e.to_rpc_error(),
                ));
            }
        };

        let (id, method, params) = match envelope {
            Envelope::Request(req) => (reply_id(Some(&req.id)), req.method, req.params),
            Envelope::Notification(n) => (reply_id(None), n.method, n.params),
            Envelope::Response(resp) => {
                debug!(id = ?resp.id, is_error = resp.is_error(), "inbound response ignored");
                return None;
            }
        };
        let _ = tracing::Span::current().record("method", method.as_str());

        let routed = std::panic::AssertUnwindSafe(self.route(session, &method, params))
            .catch_unwind()
            .await;

        match routed {
            Ok(Ok(Some(result))) => Some(Response::success(id, result)),
            Ok(Ok(None)) => None,
            Ok(Err(err)) => {
                debug!(code = err.code().as_i32(), error = %err, "request failed");
                Some(Response::error(Some(id), &err))
            }
            Err(panic) => {
                let msg = panic_message(&panic);
                error!(panic = %msg, "handler panicked");
                Some(Response::error(
                    Some(id),
                    &RpcError::internal(format!("Internal error: {msg}")),
                ))
            }
        }
    }

    async fn route(
        &self,
        session: &Session,
        name: &str,
        params: Option<Value>,
    ) -> Result<Option<Value>, RpcError> {
        let method = Method::from_name(name).ok_or_else(|| RpcError::MethodNotFound {
            method: name.to_string(),
        })?;
        if method.requires_ready() {
            require_ready(session)?;
        }

        let params = params.as_ref();
        match method {
            Method::Initialize => self.initialize(session, params).map(Some),
            Method::Initialized => self.initialized(session).map(|()| None),
            Method::Ping => Ok(Some(handlers::ping())),
            Method::ToolsList => Ok(Some(self.tools_list().await)),
            Method::ToolsCall => self.tools_call(params).await.map(Some),
            Method::ResourcesList => Ok(Some(handlers::resources_list())),
            Method::ResourcesRead => handlers::resources_read(params).map(Some),
            Method::PromptsList => Ok(Some(self.prompts_list().await)),
            Method::PromptsGet => self.prompts_get(params).await.map(Some),
        }
    }

    fn push(&self, session: &Session, response: &Response) {
        let out = OutboundEnvelope::from(response.clone());
        let frame = match codec::encode(&out, Some(MESSAGE_EVENT)) {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, "failed to encode response");
                return;
            }
        };
        match session.push(frame) {
            Ok(()) => session.touch(),
            Err(e) => {
                warn!(error = %e, "push failed, removing session");
                let _ = self.registry.remove(&session.id);
            }
        }
    }
}

/// The single handshake guard shared by every post-handshake method.
fn require_ready(session: &Session) -> Result<(), RpcError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(RpcError::authentication("Session not initialized"))
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
