//! Message envelopes exchanged over the shared transport.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::call::{CallId, CallRequest};

/// Outbound envelope, tagged by `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ClientMessage {
    /// Start a call. The identifier travels inside the nested descriptor.
    #[serde(rename = "request")]
    Request { operation: CallRequest },
    /// Abandon a subscription. The identifier travels at the top level.
    #[serde(rename = "subscription.stop")]
    SubscriptionStop { id: CallId },
}

impl ClientMessage {
    /// The call identifier this envelope carries, wherever it sits.
    #[must_use]
    pub fn id(&self) -> &CallId {
        match self {
            Self::Request { operation } => &operation.id,
            Self::SubscriptionStop { id } => id,
        }
    }

    /// Copy of this envelope with the identifier replaced.
    ///
    /// The router uses this at the transport boundary; the original message
    /// is never mutated.
    #[must_use]
    pub fn with_id(&self, id: CallId) -> Self {
        match self {
            Self::Request { operation } => Self::Request {
                operation: CallRequest {
                    id,
                    ..operation.clone()
                },
            },
            Self::SubscriptionStop { .. } => Self::SubscriptionStop { id },
        }
    }
}

/// Inbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CallId>,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl ResponseMessage {
    /// Successful data response.
    #[must_use]
    pub fn data(id: impl Into<CallId>, data: Value) -> Self {
        Self {
            id: Some(id.into()),
            body: ResponseBody::Result(ResultPayload::Data { data }),
        }
    }

    /// Terminal `stopped` response.
    #[must_use]
    pub fn stopped(id: impl Into<CallId>) -> Self {
        Self {
            id: Some(id.into()),
            body: ResponseBody::Result(ResultPayload::Stopped),
        }
    }

    /// Error-shaped response.
    #[must_use]
    pub fn error(id: impl Into<CallId>, error: ErrorShape) -> Self {
        Self {
            id: Some(id.into()),
            body: ResponseBody::Error(error),
        }
    }
}

/// The two response bodies the remote side may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    Result(ResultPayload),
    Error(ErrorShape),
}

/// Result payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultPayload {
    Started,
    Data { data: Value },
    Stopped,
    /// Result types this client does not know about are routed but carry no
    /// data.
    #[serde(other)]
    Unknown,
}

/// Error payload of an error-shaped response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for ErrorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}
