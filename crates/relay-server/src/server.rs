//! `RelayServer`: axum HTTP surface over the protocol core.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use relay_catalog::{OperationCatalog, PromptCatalog};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::errors::{AdmissionError, TransportError};
use crate::health::{self, HealthResponse};
use crate::registry::SessionRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::sweeper::run_sweeper;
use crate::transport::SseTransport;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// SSE adapter.
    pub transport: Arc<SseTransport>,
    /// Live sessions.
    pub registry: Arc<SessionRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
}

/// A running server: bound address plus its background tasks.
pub struct ServerHandle {
    /// Address actually bound (resolves port `0`).
    pub addr: SocketAddr,
    /// Listener and sweeper tasks, for [`ShutdownCoordinator::graceful_shutdown`].
    pub handles: Vec<JoinHandle<()>>,
}

/// The relay server.
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    transport: Arc<SseTransport>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl RelayServer {
    /// Wire registry, dispatcher and transport over the given catalogs.
    pub fn new(
        config: ServerConfig,
        operations: Arc<dyn OperationCatalog>,
        prompts: Arc<dyn PromptCatalog>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.max_sessions));
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            operations,
            prompts,
            config.identity(),
        ));
        let transport = Arc::new(SseTransport::new(
            registry.clone(),
            dispatcher,
            config.send_queue_depth,
        ));
        Self {
            config,
            registry: registry.clone(),
            transport,
            shutdown: Arc::new(ShutdownCoordinator::new(registry.clone())),
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            transport: self.transport.clone(),
            registry: self.registry.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/sse", get(sse_handler))
            .route("/message", post(message_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind, serve, and start the sweeper.
    ///
    /// Both tasks stop when the shutdown coordinator fires; it closes the
    /// open push streams so the listener can drain.
    pub async fn start(&self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        let token = self.shutdown.token();
        let server = tokio::spawn(async move {
            let stop = async move { token.cancelled().await };
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
                error!(error = %e, "server stopped with error");
            }
        });

        let sweeper = tokio::spawn(run_sweeper(
            self.registry.clone(),
            self.config.heartbeat_interval(),
            self.config.session_timeout(),
            self.shutdown.token(),
        ));

        info!(
            %addr,
            max_sessions = self.config.max_sessions,
            heartbeat_secs = self.config.heartbeat_interval_secs,
            timeout_secs = self.config.session_timeout_secs,
            "relay listening"
        );
        Ok(ServerHandle {
            addr,
            handles: vec![server, sweeper],
        })
    }

    /// Live sessions.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /sse
async fn sse_handler(State(state): State<AppState>) -> Response {
    match state.transport.connect() {
        Ok(conn) => conn.into_response(),
        Err(AdmissionError::AtCapacity { .. }) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response()
        }
        Err(e @ AdmissionError::DuplicateId(_)) => {
            error!(error = %e, "session admission failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// POST /message?sessionId=<id>
async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId");
    };
    match state.transport.submit(&session_id, body).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted"),
        Err(TransportError::UnknownSession(_)) => (StatusCode::NOT_FOUND, "Session not found"),
        Err(TransportError::Closed | TransportError::Full) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Session unavailable")
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        &state.registry,
        state.start_time,
        state.shutdown.is_shutting_down(),
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use futures::StreamExt;
    use relay_catalog::{HttpCatalog, StaticPrompts};
    use tower::ServiceExt;

    use super::*;

    fn make_server(max_sessions: usize) -> RelayServer {
        let catalog = HttpCatalog::new(
            "http://127.0.0.1:1",
            "/auth",
            Duration::from_secs(1),
            Vec::new(),
        )
        .unwrap();
        RelayServer::new(
            ServerConfig {
                max_sessions,
                ..ServerConfig::default()
            },
            Arc::new(catalog),
            Arc::new(StaticPrompts::default()),
        )
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Open `/sse` and read the session id out of the endpoint event.
    async fn open_session(app: &Router) -> (String, axum::body::BodyDataStream) {
        let resp = app.clone().oneshot(get("/sse")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let mut stream = resp.into_body().into_data_stream();
        let chunk = stream.next().await.unwrap().unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        let id = text
            .lines()
            .find_map(|l| l.strip_prefix("data: /message?sessionId="))
            .unwrap()
            .to_string();
        (id, stream)
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let server = make_server(4);
        let app = server.router();
        let (_id, _stream) = open_session(&app).await;

        let resp = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 1);
        assert_eq!(parsed["ready_sessions"], 0);
    }

    #[tokio::test]
    async fn health_reports_draining_after_shutdown() {
        let server = make_server(4);
        let app = server.router();
        let _ = server.shutdown().shutdown();
        let resp = app.oneshot(get("/health")).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(parsed["status"], "draining");
    }

    #[tokio::test]
    async fn sse_sets_event_stream_content_type() {
        let server = make_server(4);
        let resp = server.router().oneshot(get("/sse")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers()["content-type"].to_str().unwrap();
        assert!(ct.starts_with("text/event-stream"));
    }

    #[tokio::test]
    async fn dropping_sse_body_removes_session() {
        let server = make_server(4);
        let app = server.router();
        let (id, stream) = open_session(&app).await;
        assert!(server.registry().get(&id).is_some());
        drop(stream);
        assert!(server.registry().get(&id).is_none());
    }

    #[tokio::test]
    async fn over_capacity_is_503() {
        let server = make_server(1);
        let app = server.router();
        let (_id, _stream) = open_session(&app).await;

        let resp = app.oneshot(get("/sse")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(resp).await, "Too many connections");
        assert_eq!(server.registry().len(), 1);
    }

    #[tokio::test]
    async fn message_without_session_id_is_400() {
        let server = make_server(4);
        let resp = server.router().oneshot(post("/message", "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn message_for_unknown_session_is_404() {
        let server = make_server(4);
        let resp = server
            .router()
            .oneshot(post("/message?sessionId=nope", "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn message_is_accepted_and_answered_on_stream() {
        let server = make_server(4);
        let app = server.router();
        let (id, mut stream) = open_session(&app).await;

        let resp = app
            .oneshot(post(
                &format!("/message?sessionId={id}"),
                r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.contains("event: message"));
        let data = text.lines().find_map(|l| l.strip_prefix("data: ")).unwrap();
        let v: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(v["id"], 7);
        assert!(v["result"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = make_server(4);
        let resp = server.router().oneshot(get("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn start_binds_and_shuts_down() {
        let server = make_server(4);
        let handle = server.start().await.unwrap();
        assert_ne!(handle.addr.port(), 0);
        server
            .shutdown()
            .graceful_shutdown(handle.handles, Some(Duration::from_secs(5)))
            .await;
        assert!(server.shutdown().is_shutting_down());
    }
}
