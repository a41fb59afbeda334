//! Poll item registration: the contract nodes use to plug file descriptors
//! and callbacks into the data loop's `poll(2)` cycle.

use std::os::fd::RawFd;

pub type PollItemId = u32;

/// A single fd/interest pair the loop will include in its `poll(2)` set.
#[derive(Debug, Clone, Copy)]
pub struct PollFdSpec {
    pub fd: RawFd,
    pub events: i16,
}

pub const READABLE: i16 = libc::POLLIN as i16;
pub const WRITABLE: i16 = libc::POLLOUT as i16;

/// The outcome of a single poll(2) call for one of a `PollItem`'s fds.
#[derive(Debug, Clone, Copy)]
pub struct PolledFd {
    pub fd: RawFd,
    pub events: i16,
    pub revents: i16,
}

/// Callbacks return `false` to have the data loop disable the item; a
/// disabled item is skipped on every later phase but stays registered until
/// explicitly removed.
type IdleCallback = Box<dyn FnMut() -> bool + Send>;
type BeforeCallback = Box<dyn FnMut() -> bool + Send>;
type AfterCallback = Box<dyn FnMut(&[PolledFd]) -> bool + Send>;

/// A node's registration with the data loop: the fds it wants polled plus
/// the callbacks invoked at each phase of a cycle.
pub struct PollItem {
    pub fds: Vec<PollFdSpec>,
    pub enabled: bool,
    /// Called once per cycle before `poll(2)`, when the item has no fds.
    pub idle: Option<IdleCallback>,
    /// Called once per cycle, before `poll(2)` blocks.
    pub before: Option<BeforeCallback>,
    /// Called once per cycle after `poll(2)` returns, with this item's fds'
    /// `revents` filled in.
    pub after: Option<AfterCallback>,
}

impl PollItem {
    pub fn new() -> Self {
        Self {
            fds: Vec::new(),
            enabled: true,
            idle: None,
            before: None,
            after: None,
        }
    }
}

impl Default for PollItem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PollItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollItem")
            .field("fds", &self.fds)
            .field("has_idle", &self.idle.is_some())
            .field("has_before", &self.before.is_some())
            .field("has_after", &self.after.is_some())
            .finish()
    }
}
