//! Pluggable payload transformation applied at the link boundary.
//!
//! Inputs pass through [`PayloadTransformer::serialize`] before they reach
//! the wire; data payloads pass through [`PayloadTransformer::deserialize`]
//! before they reach the consumer. The multiplexing core never looks inside
//! payloads.

use serde_json::Value;
use thiserror::Error;

/// A transformer failed to encode or decode a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload transform failed: {0}")]
pub struct TransformError(pub String);

/// Encodes outgoing inputs and decodes incoming data payloads.
pub trait PayloadTransformer: Send + Sync {
    fn serialize(&self, value: Value) -> Result<Value, TransformError>;
    fn deserialize(&self, value: Value) -> Result<Value, TransformError>;
}

/// Identity transformer for links that exchange plain JSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PayloadTransformer for Passthrough {
    fn serialize(&self, value: Value) -> Result<Value, TransformError> {
        Ok(value)
    }

    fn deserialize(&self, value: Value) -> Result<Value, TransformError> {
        Ok(value)
    }
}
