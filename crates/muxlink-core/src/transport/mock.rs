//! Recording transport double for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use muxlink_wire::{ClientMessage, ResponseMessage};

use super::{MessageHandler, Transport};

/// Transport that records outbound traffic and lets tests inject inbound
/// responses as if the far side had sent them.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<ClientMessage>>,
    handler: Mutex<Option<Arc<MessageHandler>>>,
    installs: AtomicUsize,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of every message sent so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times an inbound handler has been installed.
    #[must_use]
    pub fn handler_installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Inject an inbound response; a missing handler is a silent no-op so
    /// tests can probe pre-registration behavior.
    pub fn deliver(&self, response: ResponseMessage) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(handler) = handler {
            (*handler)(response);
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, message: ClientMessage) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn on_message(&self, handler: MessageHandler) {
        self.installs.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }
}
