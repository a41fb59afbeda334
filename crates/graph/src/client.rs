//! Per-peer object ownership (§4.6).

use std::sync::Arc;

use parking_lot::Mutex;
use sg_core::{ObjectId, Signal};

/// A connected peer's identity and the objects created on its behalf.
/// `vanished` cascades removal of those objects in reverse insertion
/// (LIFO) order — the daemon performs the actual registry removals in
/// response, since only it holds the registry.
pub struct Client {
    peer: String,
    owned: Mutex<Vec<ObjectId>>,
    pub appeared: Signal<()>,
    pub vanished: Signal<()>,
}

impl Client {
    pub fn new(peer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.into(),
            owned: Mutex::new(Vec::new()),
            appeared: Signal::new(),
            vanished: Signal::new(),
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Record an object as owned by this client. Emits `appeared` the
    /// first time an object is recorded.
    pub fn own(&self, id: ObjectId) {
        let mut owned = self.owned.lock();
        let is_first = owned.is_empty();
        owned.push(id);
        drop(owned);
        if is_first {
            self.appeared.emit(&());
        }
    }

    pub fn disown(&self, id: ObjectId) {
        self.owned.lock().retain(|owned| *owned != id);
    }

    /// Ids this client owns, most-recently-added first — the order the
    /// daemon must remove them in on vanish.
    pub fn owned_ids_lifo(&self) -> Vec<ObjectId> {
        let mut ids = self.owned.lock().clone();
        ids.reverse();
        ids
    }

    pub fn vanish(&self) {
        self.vanished.emit(&());
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
