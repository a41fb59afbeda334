//! Links and their state machine (§4.4).

use std::sync::Arc;

use parking_lot::Mutex;
use sg_core::{Error, ObjectId, Result, Signal};

use crate::port::{Direction, Port};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Init,
    Negotiating,
    Allocating,
    Paused,
    Running,
    Unlinked,
    Error(String),
}

impl LinkState {
    fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Unlinked)
    }
}

fn can_transition(from: &LinkState, to: &LinkState) -> bool {
    use LinkState::*;
    if from.is_terminal() {
        return false;
    }
    match (from, to) {
        (Init, Negotiating) => true,
        (Negotiating, Allocating) => true,
        (Allocating, Paused) => true,
        (Paused, Running) | (Running, Paused) => true,
        (_, Unlinked) => true,
        (_, Error(_)) => true,
        _ => false,
    }
}

/// A directed output->input connection between two ports on (usually) two
/// different nodes.
pub struct Link {
    pub output_node: ObjectId,
    pub input_node: ObjectId,
    pub output_port: Arc<Port>,
    pub input_port: Arc<Port>,
    state: Mutex<LinkState>,
    pub state_changed: Signal<LinkState>,
    /// Fires when the link reaches `UNLINKED`, carrying the side that
    /// detached. The daemon's auto-link policy subscribes to this to
    /// re-drive the input side when the output side tears down (§4.2,
    /// §10.7 — the asymmetry is intentional).
    pub port_unlinked: Signal<Direction>,
}

impl Link {
    pub fn new(
        output_node: ObjectId,
        output_port: Arc<Port>,
        input_node: ObjectId,
        input_port: Arc<Port>,
    ) -> Arc<Self> {
        Arc::new(Self {
            output_node,
            input_node,
            output_port,
            input_port,
            state: Mutex::new(LinkState::Init),
            state_changed: Signal::new(),
            port_unlinked: Signal::new(),
        })
    }

    pub fn state(&self) -> LinkState {
        self.state.lock().clone()
    }

    pub fn set_state(&self, next: LinkState) -> Result<()> {
        let mut state = self.state.lock();
        if !can_transition(&state, &next) {
            return Err(Error::Invalid(format!(
                "illegal link transition {:?} -> {:?}",
                *state, next
            )));
        }
        let from = state.clone();
        *state = next.clone();
        drop(state);
        tracing::debug!(output = %self.output_node, input = %self.input_node, ?from, to = ?next, "link state changed");
        self.state_changed.emit(&next);
        Ok(())
    }

    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(output = %self.output_node, input = %self.input_node, %message, "link reported an error");
        let _ = self.set_state(LinkState::Error(message));
    }

    /// Tear the link down: detach both ports, transition to `UNLINKED`,
    /// and emit `port_unlinked` naming `detaching_side`.
    pub fn unlink(&self, detaching_side: Direction) -> Result<()> {
        self.set_state(LinkState::Unlinked)?;
        self.output_port.detach_link();
        self.input_port.detach_link();
        tracing::info!(output = %self.output_node, input = %self.input_node, ?detaching_side, "link unlinked");
        self.port_unlinked.emit(&detaching_side);
        Ok(())
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
