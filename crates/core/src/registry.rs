//! The object registry: dense integer ids over a free-list, paired with
//! `object_added`/`object_removed` signals.
//!
//! Generic over any [`Object`] so that `sg-graph` can define its own
//! tagged-variant union (Node/Link/Client/Factory/Daemon) without this
//! crate needing to know about any of those concrete types.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::id::{ObjectId, TypeCode, TypeRegistry};
use crate::object::Object;
use crate::signal::Signal;

/// Payload of [`Registry::object_added`].
pub struct ObjectAdded<O> {
    pub id: ObjectId,
    pub object: Arc<O>,
}

/// Payload of [`Registry::object_removed`]. The object is already gone from
/// the registry by the time subscribers observe this; the `Arc` lets them
/// finish using it without a racing `lookup`.
pub struct ObjectRemoved<O> {
    pub id: ObjectId,
    pub object: Arc<O>,
}

struct Slot<O> {
    type_code: TypeCode,
    object: Arc<O>,
}

/// A dense-id table of live objects plus the signals that fire when the
/// table changes.
pub struct Registry<O: Object> {
    types: TypeRegistry,
    slots: RwLock<Vec<Option<Slot<O>>>>,
    free: RwLock<Vec<u32>>,
    pub object_added: Signal<ObjectAdded<O>>,
    pub object_removed: Signal<ObjectRemoved<O>>,
}

impl<O: Object> Default for Registry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Object> Registry<O> {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            slots: RwLock::new(Vec::new()),
            free: RwLock::new(Vec::new()),
            object_added: Signal::new(),
            object_removed: Signal::new(),
        }
    }

    /// Intern a type URI. Equal strings always yield the same code.
    pub fn map_uri(&self, uri: &str) -> TypeCode {
        self.types.map_uri(uri)
    }

    pub fn lookup_uri(&self, code: TypeCode) -> Option<String> {
        self.types.lookup_uri(code)
    }

    /// Insert `object`, reusing the lowest free id if one exists, and emit
    /// `object_added`.
    pub fn add(&self, object: Arc<O>) -> ObjectId {
        let type_code = self.types.map_uri(object.type_uri());
        let id = {
            let mut slots = self.slots.write();
            let mut free = self.free.write();
            let slot = Slot { type_code, object: object.clone() };
            if let Some(index) = free.pop() {
                slots[index as usize] = Some(slot);
                ObjectId(index)
            } else {
                slots.push(Some(slot));
                ObjectId((slots.len() - 1) as u32)
            }
        };
        self.object_added.emit(&ObjectAdded { id, object });
        id
    }

    /// Remove the object at `id`, freeing its slot for reuse, and emit
    /// `object_removed`. Returns `None` if `id` was not live.
    ///
    /// Per the registry's ordering invariant, the emission happens while
    /// the slot is still populated: subscribers that `lookup(id)` from
    /// inside the handler still observe the object as present.
    pub fn remove(&self, id: ObjectId) -> Option<Arc<O>> {
        let object = self
            .slots
            .read()
            .get(id.0 as usize)?
            .as_ref()
            .map(|slot| slot.object.clone())?;
        self.object_removed.emit(&ObjectRemoved { id, object: object.clone() });
        let mut slots = self.slots.write();
        if slots.get_mut(id.0 as usize).and_then(|s| s.take()).is_some() {
            self.free.write().push(id.0);
        }
        Some(object)
    }

    pub fn lookup(&self, id: ObjectId) -> Option<Arc<O>> {
        self.slots
            .read()
            .get(id.0 as usize)
            .and_then(|slot| slot.as_ref().map(|s| s.object.clone()))
    }

    /// Snapshot of every live `(id, object)` pair, in ascending id order.
    pub fn iter(&self) -> Vec<(ObjectId, Arc<O>)> {
        self.slots
            .read()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref().map(|s| (ObjectId(index as u32), s.object.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.read().iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "test-support")]
impl<O: Object> Registry<O> {
    /// Total slots ever allocated, live or freed. White-box helper for
    /// integration tests asserting free-list reuse (an id that has been
    /// removed and re-added lands in the same slot rather than growing the
    /// table) without depending on `ObjectId` values alone.
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
