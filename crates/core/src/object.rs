//! The contract a value must satisfy to live in a [`Registry`](crate::registry::Registry).
//!
//! `sg-core` has no notion of Node, Link, Client, or Factory — those are
//! `sg-graph` and `sg-daemon` concerns, and depend on `sg-core` rather than
//! the reverse. What the registry needs from any object it stores is just
//! a type URI to intern, so downstream crates define their own
//! tagged-variant enum (e.g. `sg-graph`'s `RegistryObject`, wrapping
//! `Arc<Node>` / `Arc<Link>` / `Arc<Client>` cases) and implement this
//! trait for it once.

/// Something storable in a [`Registry`](crate::registry::Registry).
pub trait Object: Send + Sync + 'static {
    /// The URI interned via [`TypeRegistry::map_uri`](crate::id::TypeRegistry::map_uri),
    /// e.g. `"sg:node"`.
    fn type_uri(&self) -> &str;
}
