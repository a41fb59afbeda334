//! Ports: a node's input/output attachment points for links.

use std::sync::Arc;

use parking_lot::Mutex;
use sg_core::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// The format a link negotiated for a port. The concrete grammar is a
/// collaborator concern (§6); the core only needs to know a format exists
/// once negotiation completes, not what is inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiatedFormat(pub Vec<u8>);

/// Buffer pool parameters agreed during a link's `ALLOCATING` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPool {
    pub buffer_count: u32,
    pub buffer_size: u32,
}

/// A single input or output attachment point on a [`Node`](crate::node::Node).
pub struct Port {
    pub direction: Direction,
    format: Mutex<Option<NegotiatedFormat>>,
    buffer_pool: Mutex<Option<BufferPool>>,
    link: Mutex<Option<ObjectId>>,
}

impl Port {
    pub fn new(direction: Direction) -> Arc<Self> {
        Arc::new(Self {
            direction,
            format: Mutex::new(None),
            buffer_pool: Mutex::new(None),
            link: Mutex::new(None),
        })
    }

    pub fn is_free(&self) -> bool {
        self.link.lock().is_none()
    }

    pub fn linked_to(&self) -> Option<ObjectId> {
        *self.link.lock()
    }

    /// Attach this port to a link. Returns `false` if the port was already
    /// linked (a port may be linked on at most one side at a time, §3).
    pub fn attach_link(&self, id: ObjectId) -> bool {
        let mut link = self.link.lock();
        if link.is_some() {
            return false;
        }
        *link = Some(id);
        true
    }

    pub fn detach_link(&self) -> Option<ObjectId> {
        self.link.lock().take()
    }

    pub fn set_format(&self, format: NegotiatedFormat) {
        *self.format.lock() = Some(format);
    }

    pub fn format(&self) -> Option<NegotiatedFormat> {
        self.format.lock().clone()
    }

    pub fn set_buffer_pool(&self, pool: BufferPool) {
        *self.buffer_pool.lock() = Some(pool);
    }

    pub fn buffer_pool(&self) -> Option<BufferPool> {
        *self.buffer_pool.lock()
    }
}
