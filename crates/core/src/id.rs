//! Object identifiers and the process-wide type-URI intern table.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use std::collections::HashMap;

/// Stable integer id of an [`Object`](crate::object::Object) while it is
/// present in the [`Registry`](crate::registry::Registry).
///
/// Ids are dense: the registry reuses the lowest free id rather than
/// handing out ever-increasing counters, so an id that has been removed
/// and looked up again will simply fail the lookup rather than alias a
/// new object — callers must not retain an `ObjectId` past the
/// `object_removed` signal for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        ObjectId(v)
    }
}

/// Integer code for an interned type URI, e.g. `"sg:node"` -> `TypeCode(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode(pub u32);

/// Process-wide, write-once-per-value interning of type URIs to integer
/// codes. Equal strings always map to the same code within a process,
/// per the registry's `map_uri` contract.
#[derive(Default)]
pub struct TypeRegistry {
    codes: RwLock<HashMap<String, TypeCode>>,
    next: AtomicU32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            next: AtomicU32::new(0),
        }
    }

    /// Idempotent: the same URI always yields the same code.
    pub fn map_uri(&self, uri: &str) -> TypeCode {
        if let Some(code) = self.codes.read().get(uri) {
            return *code;
        }
        let mut codes = self.codes.write();
        if let Some(code) = codes.get(uri) {
            return *code;
        }
        let code = TypeCode(self.next.fetch_add(1, Ordering::Relaxed));
        codes.insert(uri.to_string(), code);
        code
    }

    pub fn lookup_uri(&self, code: TypeCode) -> Option<String> {
        self.codes
            .read()
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(uri, _)| uri.clone())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
