//! Control-plane DTOs and the client-node wire envelope (§6, §10.4).
//!
//! This crate owns only the framing this implementation is responsible
//! for: the `CreateNode`/`CreateClientNode` request/reply shapes, the
//! properties <-> variant-dictionary round trip, and the length-prefixed
//! envelope the data loop reads off a client-node's real-time socket. The
//! POD-style grammar carried inside a `Command`/`Event` body belongs to
//! the node implementation on the other end and is represented here only
//! as an opaque JSON value.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod control;
pub mod envelope;
pub mod property_map;

pub use control::{
    CreateClientNodeRequest, CreateClientNodeResponse, CreateNodeRequest, CreateNodeResponse,
};
pub use envelope::{read_frame, write_frame, Command, Envelope, Event, FrameError};
pub use property_map::PropertyMap;
