//! The composition root: owns the registry, both loops, the factory and
//! client tables, and the graph policy, and exposes the operations the
//! control plane dispatches onto (§10.1, §10.7).

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rand::Rng;

use sg_core::{ObjectId, Properties};
use sg_dataloop::{DataLoop, MainLoop};
use sg_graph::client::Client;
use sg_graph::client_node::ClientNodeSockets;
use sg_graph::node::{Node, NodeState};
use sg_graph::object::{DaemonInfo, GraphRegistry, NodeFactory, RegistryObject};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::policy::GraphPolicy;

/// A registered factory's constructor, invoked with the requested name and
/// properties to produce a fresh, unregistered [`Node`]. Kept as a plain
/// function pointer rather than a trait object since every factory this
/// daemon ships is a fixed, known set (§4.2); `sg_graph::object::NodeFactory`
/// itself stays name-only so the registry's view of a factory is pure
/// introspection.
pub type NodeConstructor = fn(name: &str, properties: Properties) -> Arc<Node>;

struct FactoryEntry {
    object_id: ObjectId,
    construct: NodeConstructor,
}

/// The daemon's top-level state: the registry, both loops, and everything
/// that dispatches onto them. Always held behind an `Arc` since the graph
/// policy and every control-plane handler need to reach back into it.
pub struct Daemon {
    pub registry: Arc<GraphRegistry>,
    pub data_loop: Arc<DataLoop>,
    pub main_loop: Mutex<MainLoop>,
    factories: Mutex<IndexMap<String, FactoryEntry>>,
    clients: Mutex<IndexMap<String, Arc<Client>>>,
    /// Server-side halves of every client-node's socketpairs, keyed by the
    /// node's registry id, kept alive here so the peer-side fds handed out
    /// by `create_client_node` stay open until the node is removed.
    pub(crate) client_node_sockets: Mutex<IndexMap<ObjectId, ClientNodeSockets>>,
    policy: Arc<GraphPolicy>,
    removing: Arc<Mutex<HashSet<ObjectId>>>,
    daemon_object_id: ObjectId,
}

impl Daemon {
    pub fn new(config: &Config) -> Result<Arc<Self>> {
        let registry = Arc::new(GraphRegistry::new());
        let data_loop = Arc::new(DataLoop::new(config.ring_capacity).map_err(Error::from)?);
        let removing = Arc::new(Mutex::new(HashSet::new()));
        let policy = GraphPolicy::install(registry.clone(), data_loop.clone(), removing.clone());

        let cookie = rand::thread_rng().gen();
        let info = DaemonInfo {
            user_name: whoami(),
            host_name: hostname(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: "sgd".to_string(),
            cookie,
            properties: Properties::new(),
        };
        let daemon_object_id = registry.add(Arc::new(RegistryObject::Daemon(Arc::new(info))));

        Ok(Arc::new(Self {
            registry,
            data_loop,
            main_loop: Mutex::new(MainLoop::new()),
            factories: Mutex::new(IndexMap::new()),
            clients: Mutex::new(IndexMap::new()),
            client_node_sockets: Mutex::new(IndexMap::new()),
            policy,
            removing,
            daemon_object_id,
        }))
    }

    pub fn daemon_object_id(&self) -> ObjectId {
        self.daemon_object_id
    }

    /// Register a named node constructor. Also registers a `NodeFactory`
    /// registry object so the factory is observable like everything else
    /// (§4.2); re-registering an existing name replaces both.
    pub fn register_factory(&self, name: impl Into<String>, construct: NodeConstructor) -> ObjectId {
        let name = name.into();
        let object_id = self
            .registry
            .add(Arc::new(RegistryObject::Factory(Arc::new(NodeFactory { name: name.clone() }))));

        let mut factories = self.factories.lock();
        if let Some(previous) = factories.insert(name, FactoryEntry { object_id, construct }) {
            self.registry.remove(previous.object_id);
        }
        object_id
    }

    pub fn unregister_factory(&self, name: &str) {
        if let Some(entry) = self.factories.lock().shift_remove(name) {
            self.registry.remove(entry.object_id);
        }
    }

    pub(crate) fn construct_node(&self, factory_name: &str, name: &str, properties: Properties) -> Result<Arc<Node>> {
        let factories = self.factories.lock();
        let entry = factories
            .get(factory_name)
            .ok_or_else(|| Error::not_found(sg_wire::control::ERR_CANT_FIND_FACTORY))?;
        Ok((entry.construct)(name, properties))
    }

    /// Look up or create the [`Client`] tracking object for `peer`,
    /// registering it in the graph registry the first time it's seen.
    pub fn client_for_peer(&self, peer: &str) -> Arc<Client> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(peer) {
            return client.clone();
        }
        let client = Client::new(peer);
        self.registry.add(Arc::new(RegistryObject::Client(client.clone())));
        clients.insert(peer.to_string(), client.clone());
        client
    }

    /// Publish `node`, owning it under `client` if one is given, and run
    /// the graph policy's "node created" procedure to completion before
    /// returning (§4.2's auto-link happens synchronously with creation).
    pub fn publish_node(&self, node: Arc<Node>, client: Option<&Arc<Client>>) -> ObjectId {
        let id = self.registry.add(Arc::new(RegistryObject::Node(node.clone())));
        if let Some(client) = client {
            client.own(id);
        }
        // §4.3: CREATING -> SUSPENDED is publication complete and is the
        // trigger for the daemon's "node created" procedure; the
        // `object_added` handler has already subscribed `state_changed`
        // by the time `registry.add` returns, so this emit drives it.
        let _ = node.set_state(NodeState::Suspended);
        id
    }

    /// Tear down every link touching `id`, then remove it from the
    /// registry. Marks `id` as removing first so a concurrent auto-link
    /// resolution never targets a node mid-teardown (§4.2).
    pub fn remove_object(&self, id: ObjectId) {
        self.removing.lock().insert(id);
        self.policy.teardown_links_for_node(id);
        self.registry.remove(id);
        self.client_node_sockets.lock().shift_remove(&id);
        self.removing.lock().remove(&id);
    }

    /// A peer vanished: cascade-remove everything it owns in LIFO order,
    /// then drop its `Client` tracking object (§4.6).
    pub fn client_vanished(&self, peer: &str) {
        let Some(client) = self.clients.lock().shift_remove(peer) else { return };
        client.vanish();
        for id in client.owned_ids_lifo() {
            self.remove_object(id);
        }
        if let Some(client_id) = self.find_client_object_id(&client) {
            self.registry.remove(client_id);
        }
    }

    fn find_client_object_id(&self, client: &Arc<Client>) -> Option<ObjectId> {
        self.registry.iter().into_iter().find_map(|(id, object)| {
            object.as_client().filter(|c| Arc::ptr_eq(c, client)).map(|_| id)
        })
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
