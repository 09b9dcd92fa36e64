//! Multiplexing router that owns the shared transport.
//!
//! Each registered client gets a process-unique namespace. Outbound call
//! identifiers are rewritten into `namespace:id` composites so two clients
//! picking the same original identifier can never collide on the wire;
//! inbound responses are split back apart and forwarded to the owning client
//! with the original identifier restored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::{debug, info};

use muxlink_wire::{CallId, ClientMessage, ResponseMessage, compose_id, split_composite};

use crate::client::ClientShared;
use crate::transport::Transport;

/// Routes messages between logical clients and the shared transport.
///
/// Constructed explicitly and shared by reference; there is no process-wide
/// instance. Registering the first client installs the single inbound
/// handler on the transport; the handler stays installed for the router's
/// lifetime.
pub struct MessageRouter {
    transport: Arc<dyn Transport>,
    /// Namespace -> client. Weak so the registry never keeps a client alive;
    /// a dead entry routes like an unregistered one.
    clients: Mutex<HashMap<String, Weak<ClientShared>>>,
    next_namespace: AtomicU64,
    /// Install-once guard for the inbound handler. A flag rather than an
    /// is-registry-empty check: unregistering every client must not cause a
    /// second installation.
    handler_installed: Mutex<bool>,
}

impl MessageRouter {
    /// Create a router owning the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            clients: Mutex::new(HashMap::new()),
            next_namespace: AtomicU64::new(1),
            handler_installed: Mutex::new(false),
        })
    }

    /// Register a client and return its namespace.
    pub(crate) fn register(self: &Arc<Self>, client: Weak<ClientShared>) -> String {
        let namespace = format!("c{}", self.next_namespace.fetch_add(1, Ordering::Relaxed));
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace.clone(), client);

        let mut installed = self
            .handler_installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*installed {
            // The handler captures the router weakly; the transport must not
            // keep the router alive.
            let router = Arc::downgrade(self);
            self.transport.on_message(Box::new(move |response| {
                if let Some(router) = router.upgrade() {
                    router.route(response);
                }
            }));
            *installed = true;
            debug!("Inbound transport handler installed");
        }
        drop(installed);

        info!(namespace = %namespace, "Client registered");
        namespace
    }

    /// Remove a client's namespace mapping. The inbound handler stays
    /// installed and other clients are unaffected.
    pub(crate) fn unregister(&self, namespace: &str) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(namespace);
        info!(namespace, "Client unregistered");
    }

    /// Rewrite an outbound message to carry the composite identifier and
    /// hand it to the transport. The caller's message is left untouched; the
    /// transport only ever sees composite identifiers.
    pub(crate) fn send(&self, namespace: &str, message: &ClientMessage) {
        let composite = compose_id(namespace, message.id());
        debug!(namespace, id = %composite, "Sending message");
        self.transport.send(message.with_id(CallId::Text(composite)));
    }

    /// Demultiplex one inbound message to its owning client.
    ///
    /// A message with no identifier, a non-composite identifier, or a
    /// namespace without a live client is dropped: a response arriving after
    /// its client tore down is an expected race, not a fault, and foreign
    /// traffic may share the transport.
    fn route(&self, response: ResponseMessage) {
        let Some(id) = &response.id else {
            debug!("Dropping response without id");
            return;
        };

        let composite = id.to_string();
        let Some((namespace, original)) = split_composite(&composite) else {
            debug!(id = %composite, "Dropping response with non-composite id");
            return;
        };

        let client = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .and_then(Weak::upgrade);

        match client {
            Some(client) => {
                debug!(namespace, id = %original, "Routing response");
                client.handle_response(ResponseMessage {
                    id: Some(original),
                    body: response.body,
                });
            }
            None => debug!(namespace, "Dropping response for unknown client"),
        }
    }
}
