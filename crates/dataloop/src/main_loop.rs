//! Cooperative event loop for the control thread: the same poll-item
//! contract as the data loop, minus the cross-thread invoke ring, since
//! nothing but the control thread itself ever touches it.

use crate::error::Result;
use crate::poll_item::{PollFdSpec, PollItem, PollItemId, PolledFd};

struct Entry {
    id: PollItemId,
    item: PollItem,
}

/// A single-threaded reactor used by the daemon to multiplex listener and
/// client-node control sockets without a dedicated thread.
pub struct MainLoop {
    entries: Vec<Entry>,
    next_id: PollItemId,
    pollfds: Vec<libc::pollfd>,
    idx: Vec<Option<usize>>,
    rebuild: bool,
}

impl MainLoop {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            pollfds: Vec::new(),
            idx: Vec::new(),
            rebuild: true,
        }
    }

    pub fn add_item(&mut self, item: PollItem) -> PollItemId {
        let id = self.next_id;
        self.next_id += 1;
        if !item.fds.is_empty() {
            self.rebuild = true;
        }
        self.entries.push(Entry { id, item });
        id
    }

    pub fn update_item(&mut self, id: PollItemId, item: PollItem) {
        if !item.fds.is_empty() {
            self.rebuild = true;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.item = item;
        }
    }

    pub fn remove_item(&mut self, id: PollItemId) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            if !self.entries[pos].item.fds.is_empty() {
                self.rebuild = true;
            }
            self.entries.remove(pos);
        }
    }

    fn rebuild_pollfds(&mut self) {
        self.pollfds.clear();
        self.idx.clear();
        for entry in &self.entries {
            if !entry.item.enabled || entry.item.fds.is_empty() {
                self.idx.push(None);
                continue;
            }
            self.idx.push(Some(self.pollfds.len()));
            for spec in &entry.item.fds {
                self.pollfds.push(to_pollfd(spec));
            }
        }
        self.rebuild = false;
    }

    /// Run one idle/rebuild/before/poll/after cycle, blocking in `poll(2)`
    /// for up to `timeout_ms` (or indefinitely if `None`).
    pub fn iterate(&mut self, timeout_ms: Option<i32>) -> Result<()> {
        for entry in &mut self.entries {
            if entry.item.enabled {
                if let Some(idle) = entry.item.idle.as_mut() {
                    if !idle() {
                        entry.item.enabled = false;
                    }
                }
            }
        }

        if self.rebuild {
            self.rebuild_pollfds();
        }

        for entry in &mut self.entries {
            if entry.item.enabled {
                if let Some(before) = entry.item.before.as_mut() {
                    if !before() {
                        entry.item.enabled = false;
                    }
                }
            }
        }

        if self.pollfds.is_empty() {
            return Ok(());
        }

        let r = unsafe {
            libc::poll(
                self.pollfds.as_mut_ptr(),
                self.pollfds.len() as libc::nfds_t,
                timeout_ms.unwrap_or(-1),
            )
        };
        if r < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(crate::error::Error::Fatal(err));
        }
        if r == 0 {
            return Ok(());
        }

        for (i, entry) in self.entries.iter_mut().enumerate() {
            if !entry.item.enabled {
                continue;
            }
            let Some(after) = entry.item.after.as_mut() else { continue };
            let fds_empty = entry.item.fds.is_empty();
            let polled: Vec<PolledFd> = match self.idx[i] {
                Some(start) => self.pollfds[start..start + entry.item.fds.len()]
                    .iter()
                    .map(|p| PolledFd { fd: p.fd, events: p.events, revents: p.revents })
                    .collect(),
                None => Vec::new(),
            };
            let any_revents = polled.iter().any(|p| p.revents != 0);
            if fds_empty || any_revents {
                if !after(&polled) {
                    entry.item.enabled = false;
                }
            }
        }
        Ok(())
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn to_pollfd(spec: &PollFdSpec) -> libc::pollfd {
    libc::pollfd {
        fd: spec.fd,
        events: spec.events,
        revents: 0,
    }
}

#[cfg(test)]
#[path = "main_loop_tests.rs"]
mod main_loop_tests;
