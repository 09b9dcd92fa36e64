//! Client-side multiplexer for a request/response/subscription RPC protocol.
//!
//! Many independent logical clients share one duplex, message-oriented
//! transport. The pieces:
//! - [`router::MessageRouter`] owns the transport, namespaces outbound call
//!   identifiers and demultiplexes inbound responses back to the owning
//!   client.
//! - [`client::Client`] keeps the pending-call table for one logical
//!   connection and hands out cancellation handles.
//! - [`link::RpcLink`] bridges the callback-based client interface to async
//!   result streams, applying a pluggable payload transformer.
//! - [`transport`] defines the transport abstraction plus an in-process
//!   channel implementation and a recording mock for tests.

pub mod client;
pub mod error;
pub mod link;
pub mod router;
pub mod tracing_init;
pub mod transform;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{CallHandle, Client, ResultSink};
pub use error::CallError;
pub use link::{CallStream, RpcLink};
pub use router::MessageRouter;
pub use transform::{Passthrough, PayloadTransformer, TransformError};
pub use transport::{MessageHandler, Transport};
