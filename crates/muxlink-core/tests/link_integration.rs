#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the full flow: link → client → router → transport,
//! with the test body playing the remote side through a `TransportPeer`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;

use muxlink_core::router::MessageRouter;
use muxlink_core::transform::{PayloadTransformer, TransformError};
use muxlink_core::transport::channel::{ChannelConfig, TransportPeer, channel};
use muxlink_core::{CallError, CallStream, RpcLink};
use muxlink_wire::{CallKind, CallRequest, ClientMessage, ErrorShape, ResponseMessage};

/// Helper to wire a link to a peer-driven in-process transport.
fn test_link() -> (RpcLink, TransportPeer) {
    let (transport, peer) = channel(&ChannelConfig::default());
    let router = MessageRouter::new(transport);
    (RpcLink::new(&router), peer)
}

/// Unwrap the call descriptor out of a start-call envelope.
fn operation(message: ClientMessage) -> CallRequest {
    match message {
        ClientMessage::Request { operation } => operation,
        other => panic!("expected request envelope, got {other:?}"),
    }
}

/// A short window in which nothing must arrive.
async fn stays_pending(stream: &mut CallStream) -> bool {
    timeout(Duration::from_millis(50), stream.next()).await.is_err()
}

// =========================================================================
// Query / mutation round trips
// =========================================================================

#[tokio::test]
async fn query_round_trip() {
    muxlink_core::tracing_init::init_tracing("muxlink_core=debug", false);

    let (link, mut peer) = test_link();
    let mut stream = link.query("ping", Value::Null);

    let message = peer.recv().await.unwrap();
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "method": "request",
            "operation": {"id": "c1:1", "type": "query", "path": "ping", "context": {}},
        })
    );

    let response: ResponseMessage =
        serde_json::from_value(json!({"id": "c1:1", "result": {"type": "data", "data": "pong"}}))
            .unwrap();
    peer.deliver(response);

    assert_eq!(stream.next().await.unwrap().unwrap(), json!("pong"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn mutation_round_trip() {
    let (link, mut peer) = test_link();
    let mut stream = link.mutation("user.rename", json!({"name": "ada"}));

    let op = operation(peer.recv().await.unwrap());
    assert_eq!(op.kind, CallKind::Mutation);
    assert_eq!(op.path, "user.rename");
    assert_eq!(op.input, json!({"name": "ada"}));

    peer.deliver(ResponseMessage::data(op.id.clone(), json!("ok")));

    assert_eq!(stream.next().await.unwrap().unwrap(), json!("ok"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn interlaced_responses_resolve_only_their_calls() {
    let (link, mut peer) = test_link();

    let mut first = link.query("a", Value::Null);
    let mut second = link.query("b", Value::Null);
    let mut third = link.query("c", Value::Null);

    let op1 = operation(peer.recv().await.unwrap());
    let _op2 = operation(peer.recv().await.unwrap());
    let op3 = operation(peer.recv().await.unwrap());

    peer.deliver(ResponseMessage::data(op1.id.clone(), json!("first")));
    peer.deliver(ResponseMessage::data(op3.id.clone(), json!("third")));

    assert_eq!(first.next().await.unwrap().unwrap(), json!("first"));
    assert_eq!(third.next().await.unwrap().unwrap(), json!("third"));
    assert!(stays_pending(&mut second).await);
}

// =========================================================================
// Subscription lifecycle
// =========================================================================

#[tokio::test]
async fn subscription_streams_then_cancels() {
    let (link, mut peer) = test_link();
    let mut stream = link.subscribe("events", json!({"topic": "all"}));

    let op = operation(peer.recv().await.unwrap());
    assert_eq!(op.kind, CallKind::Subscription);

    for n in 1..=3 {
        peer.deliver(ResponseMessage::data(op.id.clone(), json!(n)));
    }
    for n in 1..=3 {
        assert_eq!(stream.next().await.unwrap().unwrap(), json!(n));
    }

    stream.cancel();

    // The remote side is told to stop, once, after the data deliveries.
    let stop = peer.recv().await.unwrap();
    assert_eq!(
        serde_json::to_value(&stop).unwrap(),
        json!({"method": "subscription.stop", "id": "c1:1"})
    );

    // A delivery racing the cancellation is dropped.
    peer.deliver(ResponseMessage::data(op.id.clone(), json!(4)));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn subscription_stopped_by_remote_completes() {
    let (link, mut peer) = test_link();
    let mut stream = link.subscribe("events", Value::Null);

    let op = operation(peer.recv().await.unwrap());
    peer.deliver(ResponseMessage::data(op.id.clone(), json!("tick")));
    peer.deliver(ResponseMessage::stopped(op.id.clone()));

    assert_eq!(stream.next().await.unwrap().unwrap(), json!("tick"));
    assert!(stream.next().await.is_none());
}

// =========================================================================
// Multiple links on one transport
// =========================================================================

#[tokio::test]
async fn links_sharing_a_transport_do_not_cross_talk() {
    let (transport, mut peer) = channel(&ChannelConfig::default());
    let router = MessageRouter::new(transport);
    let link_a = RpcLink::new(&router);
    let link_b = RpcLink::new(&router);

    let mut stream_a = link_a.query("ping", Value::Null);
    let mut stream_b = link_b.query("ping", Value::Null);

    let op_a = operation(peer.recv().await.unwrap());
    let op_b = operation(peer.recv().await.unwrap());

    // Both links chose original id 1; the composites still differ.
    assert_eq!(op_a.id.to_string(), "c1:1");
    assert_eq!(op_b.id.to_string(), "c2:1");

    peer.deliver(ResponseMessage::data(op_a.id.clone(), json!("for a")));

    assert_eq!(stream_a.next().await.unwrap().unwrap(), json!("for a"));
    assert!(stays_pending(&mut stream_b).await);
}

// =========================================================================
// Transformer and error paths
// =========================================================================

/// Transformer that wraps payloads on the way out and unwraps on the way in.
struct Enveloping;

impl PayloadTransformer for Enveloping {
    fn serialize(&self, value: Value) -> Result<Value, TransformError> {
        Ok(json!({"wrapped": value}))
    }

    fn deserialize(&self, value: Value) -> Result<Value, TransformError> {
        value
            .get("wrapped")
            .cloned()
            .ok_or_else(|| TransformError("missing wrapper".into()))
    }
}

#[tokio::test]
async fn transformer_applies_in_both_directions() {
    let (transport, mut peer) = channel(&ChannelConfig::default());
    let router = MessageRouter::new(transport);
    let link = RpcLink::with_transformer(&router, Arc::new(Enveloping));

    let mut stream = link.query("echo", json!("hello"));

    let op = operation(peer.recv().await.unwrap());
    assert_eq!(op.input, json!({"wrapped": "hello"}));

    peer.deliver(ResponseMessage::data(op.id.clone(), json!({"wrapped": "hello"})));

    assert_eq!(stream.next().await.unwrap().unwrap(), json!("hello"));
}

#[tokio::test]
async fn malformed_payload_surfaces_transform_error() {
    let (transport, mut peer) = channel(&ChannelConfig::default());
    let router = MessageRouter::new(transport);
    let link = RpcLink::with_transformer(&router, Arc::new(Enveloping));

    let mut stream = link.query("echo", json!("hello"));
    let op = operation(peer.recv().await.unwrap());

    peer.deliver(ResponseMessage::data(op.id.clone(), json!("bare")));

    assert!(matches!(
        stream.next().await.unwrap(),
        Err(CallError::Transform(_))
    ));
    assert!(stream.next().await.is_none());
}

/// Transformer that refuses every input.
struct Rejecting;

impl PayloadTransformer for Rejecting {
    fn serialize(&self, _value: Value) -> Result<Value, TransformError> {
        Err(TransformError("unserializable input".into()))
    }

    fn deserialize(&self, value: Value) -> Result<Value, TransformError> {
        Ok(value)
    }
}

#[tokio::test]
async fn unserializable_input_fails_before_the_wire() {
    let (transport, mut peer) = channel(&ChannelConfig::default());
    let router = MessageRouter::new(transport);
    let link = RpcLink::with_transformer(&router, Arc::new(Rejecting));

    let mut stream = link.query("echo", json!("x"));

    assert!(matches!(
        stream.next().await.unwrap(),
        Err(CallError::Transform(_))
    ));
    assert!(stream.next().await.is_none());

    // Nothing reached the transport.
    assert!(timeout(Duration::from_millis(50), peer.recv()).await.is_err());
}

#[tokio::test]
async fn remote_error_terminates_the_call() {
    let (link, mut peer) = test_link();
    let mut stream = link.query("missing.path", Value::Null);

    let op = operation(peer.recv().await.unwrap());
    peer.deliver(ResponseMessage::error(
        op.id.clone(),
        ErrorShape {
            code: -32004,
            message: "NOT_FOUND".into(),
            data: None,
        },
    ));

    match stream.next().await.unwrap() {
        Err(CallError::Remote(shape)) => assert_eq!(shape.code, -32004),
        other => panic!("expected remote error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}
