//! Control-plane request/reply DTOs for the two operations this core
//! specifies (§6). The session-bus-shaped dispatcher these ride on top of
//! is a collaborator concern (§10.1); this module only fixes the shapes
//! and error text a conforming daemon must produce.

use std::os::unix::io::RawFd;

use serde::{Deserialize, Serialize};

use crate::property_map::PropertyMap;

/// Reply text when `factory_name` names no registered factory (§6).
pub const ERR_CANT_FIND_FACTORY: &str = "can't find factory";

/// Reply text when a resolved factory's constructor fails (§6).
pub const ERR_CANT_CREATE_NODE: &str = "can't create node";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub factory_name: String,
    pub name: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeResponse {
    pub object_path: String,
}

impl From<&sg_graph::Node> for CreateNodeResponse {
    fn from(node: &sg_graph::Node) -> Self {
        Self { object_path: node.object_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientNodeRequest {
    pub name: String,
    pub properties: PropertyMap,
}

/// The two peer-side file descriptors are handed back out of band (the
/// control-plane transport that would pass them to another process is a
/// collaborator concern, §6); only the object path is meaningful to
/// serialize over a wire a remote peer could read.
#[derive(Debug, Clone)]
pub struct CreateClientNodeResponse {
    pub object_path: String,
    pub control_fd: RawFd,
    pub rt_fd: RawFd,
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
