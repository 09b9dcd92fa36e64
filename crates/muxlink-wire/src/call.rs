//! Call descriptors as chosen by the call-construction layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three call shapes the protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Query,
    Mutation,
    Subscription,
}

/// Call identifier, unique only within one client's pending calls.
///
/// The call-construction layer may pick either numeric or textual
/// identifiers; both round-trip through the composite form unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallId {
    Number(i64),
    Text(String),
}

impl CallId {
    /// Recover an identifier from its textual form: numeric iff the whole
    /// token parses as an integer, textual otherwise.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.parse::<i64>()
            .map_or_else(|_| Self::Text(text.to_owned()), Self::Number)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CallId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One call as built by the call-construction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub id: CallId,
    #[serde(rename = "type")]
    pub kind: CallKind,
    pub path: String,
    /// Input payload, already serialized by the link's transformer.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub input: Value,
    #[serde(default)]
    pub context: Map<String, Value>,
}
