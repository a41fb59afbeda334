//! The daemon's graph policy (§4.2): the single auto-link rule, the link
//! lifecycle hooks it installs on every link it creates, and the registry
//! wiring ("node created" procedure) that drives it.
//!
//! This is the one piece of business logic this core has an opinion
//! about; `sg-graph`'s types are deliberately policy-free so this module
//! is the only place that reads `target.node` or decides when to link.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use sg_core::{ObjectAdded, ObjectId};
use sg_dataloop::DataLoop;
use sg_graph::link::{Link, LinkState};
use sg_graph::node::{Node, NodeState};
use sg_graph::object::{GraphRegistry, RegistryObject};
use sg_graph::port::{Direction, Port};

/// Message reported to a node when its `target.node` property cannot be
/// resolved to a free port (§4.2).
pub const ERR_NO_MATCHING_NODE: &str = "No matching Node found";

/// Message reported to the surviving endpoint of a link torn down by its
/// peer node's removal. Distinct from the narrower port-unlinked retry
/// hook below — see DESIGN.md for why node removal reports this directly
/// instead of relying on that hook.
pub const ERR_PEER_NODE_REMOVED: &str = "peer node removed";

/// The auto-link policy plus the bookkeeping it needs: the set of node
/// ids whose "node created" procedure has already run (so the
/// `CREATING -> SUSPENDED` trigger only fires once per node, §4.3,
/// despite `SUSPENDED` also being reachable by `IDLE -> SUSPENDED`
/// oscillation) and the set of node ids currently being torn down by the
/// daemon (so a concurrent auto-link resolution skips them, §4.2).
pub struct GraphPolicy {
    registry: Arc<GraphRegistry>,
    data_loop: Arc<DataLoop>,
    removing: Arc<Mutex<HashSet<ObjectId>>>,
    published: Mutex<HashSet<ObjectId>>,
}

impl GraphPolicy {
    /// Build the policy and subscribe it to `registry`'s `object_added`
    /// signal. `removing` is shared with the daemon so node-removal code
    /// can mark an id as "being removed" before `teardown_links_for_node`
    /// runs.
    pub fn install(
        registry: Arc<GraphRegistry>,
        data_loop: Arc<DataLoop>,
        removing: Arc<Mutex<HashSet<ObjectId>>>,
    ) -> Arc<Self> {
        let policy = Arc::new(Self {
            registry: registry.clone(),
            data_loop,
            removing,
            published: Mutex::new(HashSet::new()),
        });

        let p = policy.clone();
        registry.object_added.subscribe(move |evt| Self::handle_object_added(&p, evt));

        policy
    }

    fn handle_object_added(policy: &Arc<Self>, evt: &ObjectAdded<RegistryObject>) {
        let RegistryObject::Node(node) = &*evt.object else { return };
        let node_id = evt.id;

        node.set_id(node_id);
        node.attach_data_loop(policy.data_loop.clone());

        let p1 = policy.clone();
        let n1 = node.clone();
        node.state_changed.subscribe(move |state| {
            if matches!(state, NodeState::Suspended) {
                Self::node_created(&p1, &n1, node_id);
            }
        });

        let p2 = policy.clone();
        let n2 = node.clone();
        node.ports_added.subscribe(move |port| {
            if p2.published.lock().contains(&node_id) {
                Self::try_auto_link_port(&p2, &n2, node_id, port);
            }
        });

        if at_least_suspended(&node.state()) {
            Self::node_created(policy, node, node_id);
        }
    }

    /// Enumerate all input then output ports and attempt an auto-link on
    /// each (§4.2). Idempotent per node id, since `SUSPENDED` is also
    /// reachable via `IDLE` oscillation after the node's first publish.
    fn node_created(policy: &Arc<Self>, node: &Arc<Node>, node_id: ObjectId) {
        if !policy.published.lock().insert(node_id) {
            return;
        }
        Self::retry_node_ports(policy, node, node_id);
    }

    fn retry_node_ports(policy: &Arc<Self>, node: &Arc<Node>, node_id: ObjectId) {
        for port in node.ports(Direction::Input) {
            Self::try_auto_link_port(policy, node, node_id, &port);
        }
        for port in node.ports(Direction::Output) {
            Self::try_auto_link_port(policy, node, node_id, &port);
        }
    }

    fn try_auto_link_port(policy: &Arc<Self>, node: &Arc<Node>, node_id: ObjectId, port: &Arc<Port>) {
        if !port.is_free() {
            return;
        }
        let properties = node.properties();
        // §10.7: a node with no properties at all is never a candidate for
        // auto-link, not even to report a missing-target error.
        if properties.is_empty() {
            return;
        }
        let Some(target) = properties.target_node() else { return };

        match policy.resolve_target(target, port.direction, node_id) {
            Some((peer_id, peer_node, peer_port)) => {
                Self::link_ports(policy, node_id, node, port, peer_id, &peer_node, &peer_port);
            }
            None => node.report_error(ERR_NO_MATCHING_NODE),
        }
    }

    /// Resolve `target` to a live port: scan the registry for the first
    /// node (in ascending id / iteration order) whose object path ends
    /// with `target`, skipping nodes currently being removed, then ask
    /// *that* node for a free port in `source_direction.opposite()`. A
    /// matching node with no free port fails the whole resolution rather
    /// than falling through to the next match (§4.2).
    fn resolve_target(
        &self,
        target: &str,
        source_direction: Direction,
        source_node_id: ObjectId,
    ) -> Option<(ObjectId, Arc<Node>, Arc<Port>)> {
        let removing = self.removing.lock();
        let matched = self.registry.iter().into_iter().find_map(|(id, object)| {
            if id == source_node_id || removing.contains(&id) {
                return None;
            }
            let node = object.as_node()?;
            node.object_path().ends_with(target).then(|| (id, node.clone()))
        });
        drop(removing);

        let (peer_id, peer_node) = matched?;
        let port = peer_node.find_free_port(source_direction.opposite())?;
        Some((peer_id, peer_node, port))
    }

    #[allow(clippy::too_many_arguments)]
    fn link_ports(
        policy: &Arc<Self>,
        source_id: ObjectId,
        source_node: &Arc<Node>,
        source_port: &Arc<Port>,
        peer_id: ObjectId,
        peer_node: &Arc<Node>,
        peer_port: &Arc<Port>,
    ) {
        let (output_node_id, output_node, output_port, input_node_id, input_node, input_port) =
            match source_port.direction {
                Direction::Output => {
                    (source_id, source_node.clone(), source_port.clone(), peer_id, peer_node.clone(), peer_port.clone())
                }
                Direction::Input => {
                    (peer_id, peer_node.clone(), peer_port.clone(), source_id, source_node.clone(), source_port.clone())
                }
            };

        let link = Link::new(output_node_id, output_port.clone(), input_node_id, input_port.clone());
        let link_id = policy.registry.add(Arc::new(RegistryObject::Link(link.clone())));

        if !output_port.attach_link(link_id) || !input_port.attach_link(link_id) {
            policy.registry.remove(link_id);
            return;
        }

        Self::wire_link_hooks(policy, link.clone(), output_node.clone(), input_node.clone());

        if let Err(err) = activate_link(&link, &output_node, &input_node) {
            tracing::warn!(%err, link = %link_id, "auto-link activation failed");
        }
    }

    fn wire_link_hooks(policy: &Arc<Self>, link: Arc<Link>, output_node: Arc<Node>, input_node: Arc<Node>) {
        let out_node = output_node.clone();
        let in_node = input_node.clone();
        link.state_changed.subscribe(move |state| {
            if let LinkState::Error(message) = state {
                out_node.report_error(message.clone());
                in_node.report_error(message.clone());
            }
        });

        let policy = policy.clone();
        let input_id = link.input_node;
        link.port_unlinked.subscribe(move |side| {
            if *side == Direction::Output {
                if let Some(object) = policy.registry.lookup(input_id) {
                    if let Some(input_node) = object.as_node() {
                        Self::retry_node_ports(&policy, input_node, input_id);
                    }
                }
            }
        });
    }

    /// Tear down every link where `node_id` is an endpoint: report an
    /// error to the surviving peer, unlink (emitting `port_unlinked` with
    /// the side `node_id` occupied), and evict the link from the
    /// registry. Must be called, with `node_id` already marked in
    /// `removing`, before the node itself is removed.
    pub fn teardown_links_for_node(&self, node_id: ObjectId) {
        for (link_id, object) in self.registry.iter() {
            let Some(link) = object.as_link() else { continue };
            let detaching = if link.output_node == node_id {
                Direction::Output
            } else if link.input_node == node_id {
                Direction::Input
            } else {
                continue;
            };

            let peer_id = if detaching == Direction::Output { link.input_node } else { link.output_node };
            if let Some(peer_object) = self.registry.lookup(peer_id) {
                if let Some(peer_node) = peer_object.as_node() {
                    peer_node.report_error(ERR_PEER_NODE_REMOVED);
                }
            }

            let _ = link.unlink(detaching);
            self.registry.remove(link_id);
        }
    }
}

fn at_least_suspended(state: &NodeState) -> bool {
    !matches!(state, NodeState::Creating)
}

/// Progress a freshly-linked link from `INIT` through to `RUNNING`,
/// driving both endpoint nodes to `RUNNING` as it goes (§4.4's testable
/// property: every link reaching `RUNNING` implies both endpoints do
/// too).
fn activate_link(link: &Link, output_node: &Node, input_node: &Node) -> sg_core::Result<()> {
    link.set_state(LinkState::Negotiating)?;
    link.set_state(LinkState::Allocating)?;
    link.set_state(LinkState::Paused)?;
    link.set_state(LinkState::Running)?;
    drive_node_running(output_node)?;
    drive_node_running(input_node)?;
    Ok(())
}

fn drive_node_running(node: &Node) -> sg_core::Result<()> {
    loop {
        match node.state() {
            NodeState::Suspended => node.set_state(NodeState::Idle)?,
            NodeState::Idle => node.set_state(NodeState::Paused)?,
            NodeState::Paused => node.set_state(NodeState::Running)?,
            NodeState::Running | NodeState::Creating | NodeState::Error(_) => return Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
