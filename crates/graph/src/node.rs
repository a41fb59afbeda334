//! Nodes and their state machine (§4.3).

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use sg_core::{Error, ObjectId, Properties, Result, Signal};
use sg_dataloop::DataLoop;

use crate::port::{Direction, Port};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Creating,
    Suspended,
    Idle,
    Paused,
    Running,
    Error(String),
}

impl NodeState {
    fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Error(_))
    }
}

fn can_transition(from: &NodeState, to: &NodeState) -> bool {
    use NodeState::*;
    match (from, to) {
        (Creating, Suspended) => true,
        (Suspended, Idle) | (Idle, Suspended) => true,
        (Idle, Paused) => true,
        (Paused, Running) | (Running, Paused) => true,
        (from, Error(_)) => !from.is_terminal(),
        _ => false,
    }
}

/// A processing node: ports, a monotonic state machine, and an assigned
/// data loop. Constructed via [`Node::new`] in [`NodeState::Creating`]; the
/// owning daemon assigns its registry id with [`Node::set_id`] right after
/// insertion and its object path derives from that id plus `name`.
pub struct Node {
    name: String,
    id: OnceLock<ObjectId>,
    client: Option<ObjectId>,
    state: Mutex<NodeState>,
    properties: Mutex<Properties>,
    data_loop: OnceLock<Arc<DataLoop>>,
    inputs: Mutex<Vec<Arc<Port>>>,
    outputs: Mutex<Vec<Arc<Port>>>,
    pub state_changed: Signal<NodeState>,
    /// Fires whenever a port is added after construction. The auto-link
    /// policy subscribes to this for nodes it has already published, so a
    /// port appearing on a running node gets the same per-port auto-link
    /// attempt as the ones enumerated at "node created" time (§4.2).
    pub ports_added: Signal<Arc<Port>>,
}

impl Node {
    pub fn new(name: impl Into<String>, properties: Properties, client: Option<ObjectId>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            id: OnceLock::new(),
            client,
            state: Mutex::new(NodeState::Creating),
            properties: Mutex::new(properties),
            data_loop: OnceLock::new(),
            inputs: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
            state_changed: Signal::new(),
            ports_added: Signal::new(),
        })
    }

    /// Record the id the registry assigned this node at insertion. Must be
    /// called exactly once, before `object_path` is used.
    pub fn set_id(&self, id: ObjectId) {
        let _ = self.id.set(id);
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id.get().copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> Option<ObjectId> {
        self.client
    }

    /// `/node/{name}/{id}`, the suffix the auto-link policy matches
    /// `target.node` against.
    pub fn object_path(&self) -> String {
        format!("/node/{}/{}", self.name, self.id.get().map(|id| id.0).unwrap_or(0))
    }

    pub fn attach_data_loop(&self, data_loop: Arc<DataLoop>) {
        let _ = self.data_loop.set(data_loop);
    }

    pub fn data_loop(&self) -> Option<&Arc<DataLoop>> {
        self.data_loop.get()
    }

    pub fn state(&self) -> NodeState {
        self.state.lock().clone()
    }

    /// Apply a state transition, validating it against §4.3's monotonic
    /// sequence. Emits `state_changed` on success.
    pub fn set_state(&self, next: NodeState) -> Result<()> {
        let mut state = self.state.lock();
        if !can_transition(&state, &next) {
            return Err(Error::Invalid(format!(
                "illegal node transition {:?} -> {:?}",
                *state, next
            )));
        }
        let from = state.clone();
        *state = next.clone();
        drop(state);
        tracing::debug!(node = %self.name, ?from, to = ?next, "node state changed");
        self.state_changed.emit(&next);
        Ok(())
    }

    /// Force an `ERROR` state from any non-terminal state, surfacing
    /// `message`. A no-op if the node is already terminal.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(node = %self.name, %message, "node reported an error");
        let _ = self.set_state(NodeState::Error(message));
    }

    pub fn properties(&self) -> Properties {
        self.properties.lock().clone()
    }

    /// Ports may only be added while the node is non-terminal (§3).
    pub fn add_port(&self, direction: Direction) -> Result<Arc<Port>> {
        if self.state().is_terminal() {
            return Err(Error::Invalid("cannot add a port to a terminal node".into()));
        }
        let port = Port::new(direction);
        match direction {
            Direction::Input => self.inputs.lock().push(port.clone()),
            Direction::Output => self.outputs.lock().push(port.clone()),
        }
        self.ports_added.emit(&port);
        Ok(port)
    }

    pub fn ports(&self, direction: Direction) -> Vec<Arc<Port>> {
        match direction {
            Direction::Input => self.inputs.lock().clone(),
            Direction::Output => self.outputs.lock().clone(),
        }
    }

    /// The first free port in `direction`, used by the auto-link policy to
    /// find a landing spot on the target node.
    pub fn find_free_port(&self, direction: Direction) -> Option<Arc<Port>> {
        self.ports(direction).into_iter().find(|p| p.is_free())
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
