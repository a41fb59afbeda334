//! The tagged-variant union of everything this daemon keeps in its
//! registry (§9's re-architecture guidance: a small tagged-variant
//! registry of object kinds rather than a class hierarchy).

use std::sync::Arc;

use sg_core::{Object, Properties, Registry};

use crate::client::Client;
use crate::link::Link;
use crate::node::Node;

/// A registered node factory, keyed by `name` in the daemon's factory
/// table (§4.2) and also present in the registry so the daemon observes
/// its `object_added`/`object_removed` like everything else.
pub struct NodeFactory {
    pub name: String,
}

/// The daemon's own self-registration (§10.7): the read-only property
/// surface of §6 plus the cookie fixed at construction.
pub struct DaemonInfo {
    pub user_name: String,
    pub host_name: String,
    pub version: String,
    pub name: String,
    pub cookie: u32,
    pub properties: Properties,
}

pub enum RegistryObject {
    Node(Arc<Node>),
    Link(Arc<Link>),
    Client(Arc<Client>),
    Factory(Arc<NodeFactory>),
    Daemon(Arc<DaemonInfo>),
}

impl Object for RegistryObject {
    fn type_uri(&self) -> &str {
        match self {
            RegistryObject::Node(_) => "sg:node",
            RegistryObject::Link(_) => "sg:link",
            RegistryObject::Client(_) => "sg:client",
            RegistryObject::Factory(_) => "sg:factory",
            RegistryObject::Daemon(_) => "sg:daemon",
        }
    }
}

impl RegistryObject {
    pub fn as_node(&self) -> Option<&Arc<Node>> {
        match self {
            RegistryObject::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Arc<Link>> {
        match self {
            RegistryObject::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_client(&self) -> Option<&Arc<Client>> {
        match self {
            RegistryObject::Client(client) => Some(client),
            _ => None,
        }
    }

    pub fn as_factory(&self) -> Option<&Arc<NodeFactory>> {
        match self {
            RegistryObject::Factory(factory) => Some(factory),
            _ => None,
        }
    }
}

/// The concrete registry type this daemon uses everywhere above `sg-core`.
pub type GraphRegistry = Registry<RegistryObject>;

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
