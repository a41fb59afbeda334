//! Error kinds the core distinguishes, shared by the registry, graph and
//! client-side domain types.

use thiserror::Error;

/// Errors surfaced by `sg-core`.
///
/// Control-plane handlers in `sg-daemon` convert these to reply strings via
/// `Display`; they are never allowed to unwind across that boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A factory name or target port could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed properties, paths, or state transition request.
    #[error("invalid: {0}")]
    Invalid(String),

    /// A link reached its ERROR state; carries the message surfaced to both
    /// endpoint nodes.
    #[error("node link error: {0}")]
    NodeLink(String),

    /// Socket or fd allocation failed.
    #[error("resource allocation failed: {0}")]
    Resource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
