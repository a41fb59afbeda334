//! Client-node: a node whose processing runs in a peer process, reached
//! through two socketpairs (§4.6, §10.4).

use std::os::unix::net::UnixStream;
use std::sync::Arc;

use sg_core::{Error, Properties, Result};

use crate::node::Node;

/// The server-side halves of a client-node's two socketpairs. The control
/// half is registered as a poll item on the main loop; the real-time half
/// on the data loop. The peer-side halves are handed to the caller by
/// `CreateClientNode` (as raw fds, since socket-passing over the
/// control-plane transport is a collaborator concern per §6).
pub struct ClientNodeSockets {
    pub control_server: UnixStream,
    pub control_peer: UnixStream,
    pub rt_server: UnixStream,
    pub rt_peer: UnixStream,
}

impl ClientNodeSockets {
    pub fn new() -> Result<Self> {
        let (control_server, control_peer) =
            UnixStream::pair().map_err(|e| Error::Resource(format!("socketpair failed: {e}")))?;
        let (rt_server, rt_peer) =
            UnixStream::pair().map_err(|e| Error::Resource(format!("socketpair failed: {e}")))?;
        Ok(Self {
            control_server,
            control_peer,
            rt_server,
            rt_peer,
        })
    }
}

/// A node backed by an out-of-process peer, bundling the `Node` domain
/// object with the transport that reaches it.
pub struct ClientNode {
    pub node: Arc<Node>,
    pub sockets: ClientNodeSockets,
}

impl ClientNode {
    pub fn new(name: impl Into<String>, properties: Properties) -> Result<Self> {
        Ok(Self {
            node: Node::new(name, properties, None),
            sockets: ClientNodeSockets::new()?,
        })
    }
}
