//! In-process transport backed by tokio channels.
//!
//! Models the duplex bridge between the multiplexed client side and whatever
//! serves the calls: outbound messages queue on a bounded channel for the
//! peer to pick up, inbound responses are pushed by the peer straight into
//! the installed handler.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::warn;

use muxlink_wire::{ClientMessage, ResponseMessage};

use super::{MessageHandler, Transport};

/// Configuration for the in-process channel transport.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Bound on outbound messages awaiting pickup by the peer.
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

type HandlerSlot = Arc<Mutex<Option<Arc<MessageHandler>>>>;

/// Client half of an in-process duplex channel.
pub struct ChannelTransport {
    outbound_tx: mpsc::Sender<ClientMessage>,
    handler: HandlerSlot,
}

/// Far side of the channel: receives outbound traffic, injects responses.
pub struct TransportPeer {
    outbound_rx: mpsc::Receiver<ClientMessage>,
    handler: HandlerSlot,
}

/// Create a connected transport/peer pair.
#[must_use]
pub fn channel(config: &ChannelConfig) -> (Arc<ChannelTransport>, TransportPeer) {
    let (outbound_tx, outbound_rx) = mpsc::channel(config.capacity);
    let handler: HandlerSlot = Arc::new(Mutex::new(None));

    let transport = Arc::new(ChannelTransport {
        outbound_tx,
        handler: Arc::clone(&handler),
    });

    (
        transport,
        TransportPeer {
            outbound_rx,
            handler,
        },
    )
}

impl Transport for ChannelTransport {
    fn send(&self, message: ClientMessage) {
        if let Err(err) = self.outbound_tx.try_send(message) {
            warn!(error = %err, "Dropping outbound message, channel unavailable");
        }
    }

    fn on_message(&self, handler: MessageHandler) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }
}

impl TransportPeer {
    /// Next outbound message from the client side, in send order.
    pub async fn recv(&mut self) -> Option<ClientMessage> {
        self.outbound_rx.recv().await
    }

    /// Deliver an inbound response to the installed handler, synchronously.
    ///
    /// Dropped with a warning when no handler has been installed yet.
    pub fn deliver(&self, response: ResponseMessage) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => (*handler)(response),
            None => warn!("Dropping inbound message, no handler installed"),
        }
    }
}
