//! The raw transport primitive the router drives.
//!
//! A transport is a bidirectional, order-preserving message channel with no
//! built-in addressing: `send` is fire-and-forget and `on_message` installs
//! the single inbound handler. The router guarantees it installs at most one
//! handler per transport, no matter how many clients register.

pub mod channel;
pub mod mock;

use muxlink_wire::{ClientMessage, ResponseMessage};

/// Handler invoked synchronously for every inbound transport message.
pub type MessageHandler = Box<dyn Fn(ResponseMessage) + Send + Sync>;

/// A duplex, message-oriented transport shared by every registered client.
pub trait Transport: Send + Sync {
    /// Send one outbound message. Fire-and-forget; delivery and ordering are
    /// the transport's contract.
    fn send(&self, message: ClientMessage);

    /// Install the inbound handler.
    fn on_message(&self, handler: MessageHandler);
}
