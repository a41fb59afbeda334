//! Graph domain types: nodes, ports, links, clients, and the client-node
//! contract that reaches an out-of-process node over two socketpairs.
//!
//! This crate has no opinion on *when* to auto-link or how the control
//! plane is shaped — that policy lives in `sg-daemon`, which composes
//! these types with the registry and both loops.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod client_node;
pub mod link;
pub mod node;
pub mod object;
pub mod port;

pub use client::Client;
pub use client_node::{ClientNode, ClientNodeSockets};
pub use link::{Link, LinkState};
pub use node::{Node, NodeState};
pub use object::{DaemonInfo, GraphRegistry, NodeFactory, RegistryObject};
pub use port::{BufferPool, Direction, NegotiatedFormat, Port};
