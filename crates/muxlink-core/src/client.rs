//! Logical RPC client: one pending-call table over the shared router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use muxlink_wire::{
    CallId, CallKind, CallRequest, ClientMessage, ResponseBody, ResponseMessage, ResultPayload,
};

use crate::error::CallError;
use crate::router::MessageRouter;

/// Receives the results of one call.
///
/// Injected per call. The client invokes `next` for every response routed to
/// the call and `complete` exactly once when the call reaches a terminal
/// state; `error` is the terminal path for remote and transform failures.
pub trait ResultSink: Send + Sync {
    /// Called with the cancellation handle after the pending record exists
    /// but before the start message is sent, so a sink can cancel from
    /// within its own callbacks.
    fn attach(&self, handle: CallHandle) {
        let _ = handle;
    }

    /// A response routed to this call.
    fn next(&self, response: ResponseMessage);

    /// A terminal error for this call.
    fn error(&self, error: CallError);

    /// Terminal completion.
    fn complete(&self);
}

/// One call awaiting responses.
struct PendingCall {
    kind: CallKind,
    sink: Arc<dyn ResultSink>,
    request: CallRequest,
}

/// Pending-call table, shared between the client, its cancellation handles
/// and the router's inbound path. Keyed by the original identifier; at most
/// one record per identifier exists at a time.
#[derive(Default)]
pub(crate) struct ClientShared {
    pending: Mutex<HashMap<CallId, PendingCall>>,
}

impl ClientShared {
    /// Dispatch a routed response to the matching pending call.
    ///
    /// An unknown identifier is a silent drop: the call completed or was
    /// cancelled while the response was in flight. A terminal `stopped`
    /// result evicts the record before dispatch, so a duplicate can never
    /// signal completion twice.
    pub(crate) fn handle_response(&self, response: ResponseMessage) {
        let Some(id) = response.id.clone() else {
            return;
        };
        let stopped = matches!(
            response.body,
            ResponseBody::Result(ResultPayload::Stopped)
        );

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if stopped {
            let Some(call) = pending.remove(&id) else {
                debug!(id = %id, "No pending call for response");
                return;
            };
            drop(pending);

            debug!(id = %id, path = %call.request.path, "Call stopped by remote");
            call.sink.next(response);
            call.sink.complete();
        } else {
            let sink = match pending.get(&id) {
                Some(call) => Arc::clone(&call.sink),
                None => {
                    debug!(id = %id, "No pending call for response");
                    return;
                }
            };
            drop(pending);

            sink.next(response);
        }
    }
}

/// One logical RPC connection multiplexed over the shared transport.
///
/// Registers with the router on construction and unregisters when dropped.
/// Calls still pending at teardown are not failed; responses for them simply
/// stop being routed.
pub struct Client {
    shared: Arc<ClientShared>,
    router: Arc<MessageRouter>,
    namespace: String,
}

impl Client {
    /// Create a client and register it with the router.
    #[must_use]
    pub fn new(router: &Arc<MessageRouter>) -> Self {
        let shared = Arc::new(ClientShared::default());
        let namespace = router.register(Arc::downgrade(&shared));
        Self {
            shared,
            router: Arc::clone(router),
            namespace,
        }
    }

    /// Namespace the router assigned to this client.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Start a call and return its cancellation handle.
    ///
    /// `request.id` must be unique among this client's pending calls; reusing
    /// an identifier overwrites the earlier record.
    pub fn call(&self, request: CallRequest, sink: Arc<dyn ResultSink>) -> CallHandle {
        let id = request.id.clone();
        debug!(
            namespace = %self.namespace,
            id = %id,
            path = %request.path,
            "Starting call"
        );

        let handle = CallHandle {
            shared: Arc::downgrade(&self.shared),
            router: Arc::clone(&self.router),
            namespace: self.namespace.clone(),
            id: id.clone(),
        };

        let operation = request.clone();
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                PendingCall {
                    kind: request.kind,
                    sink: Arc::clone(&sink),
                    request,
                },
            );

        // Hand over the handle before the request leaves, so no response can
        // beat it.
        sink.attach(handle.clone());
        self.router
            .send(&self.namespace, &ClientMessage::Request { operation });
        handle
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.router.unregister(&self.namespace);
    }
}

/// Cancellation handle for one pending call.
///
/// Holds the client's pending table weakly; a handle outliving its client is
/// inert.
#[derive(Clone)]
pub struct CallHandle {
    shared: Weak<ClientShared>,
    router: Arc<MessageRouter>,
    namespace: String,
    id: CallId,
}

impl CallHandle {
    /// Cancel the call.
    ///
    /// Idempotent: removing the pending record is the linearization point.
    /// The first removal signals `complete` exactly once and, for
    /// subscriptions only, sends a stop message so the remote side learns
    /// the subscription was abandoned. Later cancels are no-ops.
    pub fn cancel(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let removed = shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        let Some(call) = removed else {
            return;
        };

        debug!(namespace = %self.namespace, id = %self.id, "Call cancelled");
        call.sink.complete();

        if call.kind == CallKind::Subscription {
            self.router.send(
                &self.namespace,
                &ClientMessage::SubscriptionStop {
                    id: self.id.clone(),
                },
            );
        }
    }
}
