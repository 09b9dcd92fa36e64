//! Async call streams over one logical client.
//!
//! [`RpcLink`] owns a [`Client`] and turns the callback-based call interface
//! into async sequences of results: exactly one terminal item for queries and
//! mutations, unbounded-until-cancelled for subscriptions. Payloads pass
//! through the link's [`PayloadTransformer`] in both directions.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use muxlink_wire::{
    CallId, CallKind, CallRequest, ResponseBody, ResponseMessage, ResultPayload,
};

use crate::client::{CallHandle, Client, ResultSink};
use crate::error::CallError;
use crate::router::MessageRouter;
use crate::transform::{Passthrough, PayloadTransformer};

enum CallEvent {
    Data(Value),
    Error(CallError),
    Complete,
}

/// Results of one call as an async sequence.
///
/// `None` from [`CallStream::next`] is the completion signal; for queries and
/// mutations it follows the single result item.
pub struct CallStream {
    events: mpsc::UnboundedReceiver<CallEvent>,
    handle: Option<CallHandle>,
}

impl CallStream {
    /// Next result, or `None` once the call has completed.
    pub async fn next(&mut self) -> Option<Result<Value, CallError>> {
        match self.events.recv().await {
            Some(CallEvent::Data(value)) => Some(Ok(value)),
            Some(CallEvent::Error(error)) => Some(Err(error)),
            Some(CallEvent::Complete) | None => {
                self.events.close();
                None
            }
        }
    }

    /// Cancel the call. Completion is still signalled exactly once.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }

    /// Stream that fails immediately, for errors raised before the call ever
    /// reaches the wire.
    fn failed(error: CallError) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let _ = event_tx.send(CallEvent::Error(error));
        Self {
            events,
            handle: None,
        }
    }
}

/// Sink feeding a [`CallStream`], classifying responses the way the remote
/// protocol shapes them.
struct StreamSink {
    event_tx: mpsc::UnboundedSender<CallEvent>,
    kind: CallKind,
    transformer: Arc<dyn PayloadTransformer>,
    handle: Mutex<Option<CallHandle>>,
}

impl StreamSink {
    fn cancel(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }
}

impl ResultSink for StreamSink {
    fn attach(&self, handle: CallHandle) {
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn next(&self, response: ResponseMessage) {
        match response.body {
            ResponseBody::Error(shape) => self.error(CallError::Remote(shape)),
            ResponseBody::Result(ResultPayload::Data { data }) => {
                match self.transformer.deserialize(data) {
                    Ok(value) => {
                        let _ = self.event_tx.send(CallEvent::Data(value));
                        if self.kind != CallKind::Subscription {
                            // Queries and mutations are single-shot: the
                            // first datum is terminal.
                            self.cancel();
                        }
                    }
                    Err(error) => self.error(error.into()),
                }
            }
            // `stopped` completion arrives through `complete`; `started` and
            // unrecognized result types carry no data.
            ResponseBody::Result(
                ResultPayload::Started | ResultPayload::Stopped | ResultPayload::Unknown,
            ) => {}
        }
    }

    fn error(&self, error: CallError) {
        let _ = self.event_tx.send(CallEvent::Error(error));
        self.cancel();
    }

    fn complete(&self) {
        let _ = self.event_tx.send(CallEvent::Complete);
    }
}

/// One logical RPC connection exposing calls as async result streams.
pub struct RpcLink {
    client: Client,
    transformer: Arc<dyn PayloadTransformer>,
    next_call_id: AtomicI64,
}

impl RpcLink {
    /// Link exchanging plain JSON values.
    #[must_use]
    pub fn new(router: &Arc<MessageRouter>) -> Self {
        Self::with_transformer(router, Arc::new(Passthrough))
    }

    /// Link with a custom payload transformer.
    #[must_use]
    pub fn with_transformer(
        router: &Arc<MessageRouter>,
        transformer: Arc<dyn PayloadTransformer>,
    ) -> Self {
        Self {
            client: Client::new(router),
            transformer,
            next_call_id: AtomicI64::new(1),
        }
    }

    /// Single-shot request for a value.
    pub fn query(&self, path: &str, input: Value) -> CallStream {
        self.start(CallKind::Query, path, input)
    }

    /// Single-shot request that changes remote state.
    pub fn mutation(&self, path: &str, input: Value) -> CallStream {
        self.start(CallKind::Mutation, path, input)
    }

    /// Long-lived call streaming results until cancelled or stopped remotely.
    pub fn subscribe(&self, path: &str, input: Value) -> CallStream {
        self.start(CallKind::Subscription, path, input)
    }

    fn start(&self, kind: CallKind, path: &str, input: Value) -> CallStream {
        let input = match self.transformer.serialize(input) {
            Ok(value) => value,
            Err(error) => return CallStream::failed(error.into()),
        };

        let request = CallRequest {
            id: CallId::Number(self.next_call_id.fetch_add(1, Ordering::Relaxed)),
            kind,
            path: path.to_owned(),
            input,
            context: Map::new(),
        };

        let (event_tx, events) = mpsc::unbounded_channel();
        let sink = Arc::new(StreamSink {
            event_tx,
            kind,
            transformer: Arc::clone(&self.transformer),
            handle: Mutex::new(None),
        });

        let handle = self.client.call(request, sink);
        CallStream {
            events,
            handle: Some(handle),
        }
    }
}
