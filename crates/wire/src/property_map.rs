//! The variant dictionary `Properties` round-trips through on the wire
//! (§3; the round-trip is one of §8's testable properties).

use sg_core::Properties;
use serde::{Deserialize, Serialize};

/// Ordered string dictionary as exchanged over the control plane. Same
/// shape as [`sg_core::Properties`]; kept as a distinct type so `sg-core`
/// has no reason to know about serde-on-the-wire concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMap(Vec<(String, String)>);

impl PropertyMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&Properties> for PropertyMap {
    fn from(props: &Properties) -> Self {
        Self(props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

impl From<PropertyMap> for Properties {
    fn from(map: PropertyMap) -> Self {
        map.0.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "property_map_tests.rs"]
mod tests;
