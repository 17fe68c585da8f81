//! Transport adapters.
//!
//! The core only sees [`PushSink`](crate::session::PushSink) for the
//! server-to-client half and hands inbound text to
//! [`Dispatcher::handle_message`](crate::dispatcher::Dispatcher::handle_message).

pub mod sse;

pub use sse::{ENDPOINT_EVENT, SseConnection, SseSink, SseTransport};
