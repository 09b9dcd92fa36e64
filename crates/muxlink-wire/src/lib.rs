//! Wire message shapes for the muxlink protocol.
//!
//! Everything the shared transport carries is defined here:
//! - Call descriptors and identifiers (`call`)
//! - Outbound and inbound envelopes (`envelope`)
//! - The namespaced composite-identifier textual form (`composite`)
//!
//! The routing and client state machines live in `muxlink-core`; this crate is
//! shape only.

pub mod call;
pub mod composite;
pub mod envelope;

pub use call::{CallId, CallKind, CallRequest};
pub use composite::{NAMESPACE_SEPARATOR, compose_id, split_composite};
pub use envelope::{ClientMessage, ErrorShape, ResponseBody, ResponseMessage, ResultPayload};
