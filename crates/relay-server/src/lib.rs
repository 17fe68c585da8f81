//! # relay-server
//!
//! Protocol core and HTTP surface of the relay.
//!
//! - [`SessionRegistry`]: the one shared table of live sessions
//! - [`Dispatcher`]: per-envelope handshake gating and method routing
//! - [`sweeper`]: idle eviction and keep-alive pushes on a fixed period
//! - [`transport`]: SSE push channel plus `POST /message` submission lanes
//! - [`RelayServer`]: axum router, health endpoint, graceful shutdown

#![deny(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod health;
pub mod registry;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod sweeper;
pub mod transport;

pub use config::ServerConfig;
pub use dispatcher::{Dispatcher, Method, ServerIdentity};
pub use errors::{AdmissionError, TransportError};
pub use registry::SessionRegistry;
pub use server::{AppState, RelayServer, ServerHandle};
pub use session::{HandshakePhase, PeerInfo, PushSink, Session};
pub use shutdown::ShutdownCoordinator;
