//! Errors delivered to individual pending calls.
//!
//! Routing misses are not represented here: a response that cannot be routed
//! is dropped as normal control flow and never surfaces to any call.

use thiserror::Error;

use muxlink_wire::ErrorShape;

use crate::transform::TransformError;

/// Failure terminating exactly one call.
///
/// Never crosses from one logical client to another, and never terminates the
/// router or any other pending call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The remote side answered with an error-shaped response.
    #[error("remote call failed: {0}")]
    Remote(ErrorShape),

    /// The payload transformer rejected an otherwise well-routed response.
    #[error(transparent)]
    Transform(#[from] TransformError),
}
