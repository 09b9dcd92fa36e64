//! Namespaced composite identifiers as seen on the shared transport.
//!
//! A composite identifier is `<namespace><separator><original-id>`. Namespaces
//! are short counter tokens (`c1`, `c2`, ...) and can never contain the
//! separator; original identifiers may, so splitting always happens at the
//! first occurrence.

use crate::call::CallId;

/// Separator between the namespace token and the original identifier.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Build the composite textual form for an original identifier.
#[must_use]
pub fn compose_id(namespace: &str, id: &CallId) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}{id}")
}

/// Split a composite identifier back into namespace and original identifier.
///
/// Returns `None` for non-composite identifiers, which lets foreign traffic
/// share the transport without being routed.
#[must_use]
pub fn split_composite(composite: &str) -> Option<(&str, CallId)> {
    let (namespace, original) = composite.split_once(NAMESPACE_SEPARATOR)?;
    Some((namespace, CallId::parse(original)))
}
