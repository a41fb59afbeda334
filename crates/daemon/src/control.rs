//! Control-plane dispatch: maps `sg_wire::control` DTOs onto the daemon
//! composition root (§6).

use std::os::unix::io::AsRawFd;

use sg_core::{ObjectId, Properties};
use sg_dataloop::{PollFdSpec, PollItem, READABLE};
use sg_graph::client_node::{ClientNode, ClientNodeSockets};
use sg_wire::control::{
    CreateClientNodeRequest, CreateClientNodeResponse, CreateNodeRequest, CreateNodeResponse,
    ERR_CANT_CREATE_NODE,
};

use crate::daemon::Daemon;
use crate::error::{Error, Result};

impl Daemon {
    /// Handle a `CreateNode` request from `peer` (§6): resolve the named
    /// factory, construct and publish the node, owning it under the
    /// peer's `Client` if one is given. Auto-link (§4.2) has already run
    /// to completion by the time this returns.
    pub fn create_node(&self, peer: Option<&str>, request: CreateNodeRequest) -> Result<CreateNodeResponse> {
        let properties = Properties::from(request.properties);
        let node = self.construct_node(&request.factory_name, &request.name, properties)?;

        let client = peer.map(|peer| self.client_for_peer(peer));
        self.publish_node(node.clone(), client.as_ref());

        Ok(CreateNodeResponse::from(&*node))
    }

    /// Handle a `CreateClientNode` request (§6, §10.4): build the node's
    /// two socketpairs, publish it, wire the server-side halves onto the
    /// loops, and hand back the peer-side fds. The peer-side fds are only
    /// meaningful handed off out of band; the daemon keeps both halves of
    /// each socketpair open until the node is removed.
    pub fn create_client_node(
        &self,
        peer: Option<&str>,
        request: CreateClientNodeRequest,
    ) -> Result<CreateClientNodeResponse> {
        let properties = Properties::from(request.properties);
        let client_node = ClientNode::new(request.name, properties).map_err(|_| Error::invalid(ERR_CANT_CREATE_NODE))?;

        let control_fd = client_node.sockets.control_peer.as_raw_fd();
        let rt_fd = client_node.sockets.rt_peer.as_raw_fd();

        let client = peer.map(|peer| self.client_for_peer(peer));
        let node_id = self.publish_node(client_node.node.clone(), client.as_ref());
        // `publish_node` assigns the registry id synchronously, so the path
        // below reflects the real id rather than the pre-registration stub.
        let object_path = client_node.node.object_path();

        self.register_client_node_sockets(node_id, client_node.sockets)?;

        Ok(CreateClientNodeResponse { object_path, control_fd, rt_fd })
    }

    /// Add the server-side halves of a client-node's socketpairs to the
    /// main loop (control) and data loop (real-time), then keep the
    /// sockets alive in `client_node_sockets`.
    fn register_client_node_sockets(&self, node_id: ObjectId, sockets: ClientNodeSockets) -> Result<()> {
        let mut control_item = PollItem::new();
        control_item.fds.push(PollFdSpec { fd: sockets.control_server.as_raw_fd(), events: READABLE });
        self.main_loop.lock().add_item(control_item);

        let mut rt_item = PollItem::new();
        rt_item.fds.push(PollFdSpec { fd: sockets.rt_server.as_raw_fd(), events: READABLE });
        self.data_loop.add_item(rt_item).map_err(Error::from)?;

        self.client_node_sockets.lock().insert(node_id, sockets);
        Ok(())
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
