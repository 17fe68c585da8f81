//! # relay-protocol
//!
//! Wire protocol for the relay: JSON-RPC 2.0 shaped envelopes, the stable
//! error-code registry, and server-push framing.
//!
//! - [`codec::decode`] turns raw text into a loosely-typed [`RawEnvelope`]
//! - [`codec::validate`] classifies it as a request, notification or response
//! - [`codec::encode`] wraps an outbound envelope into a push [`Frame`]

#![deny(unsafe_code)]

pub mod codec;
pub mod envelope;
pub mod errors;
pub mod frame;

pub use codec::{decode, encode, validate, CodecError};
pub use envelope::{
    reply_id, Envelope, ErrorObject, Notification, OutboundEnvelope, RawEnvelope, Request,
    Response, PROTOCOL_TAG, UNKNOWN_ID,
};
pub use errors::{ErrorCode, RpcError};
pub use frame::Frame;
