//! The real-time data loop: a dedicated OS thread that multiplexes node
//! file descriptors via `poll(2)` and drains a cross-thread invoke queue
//! through an `eventfd`.

use std::collections::VecDeque;
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::poll_item::{PollFdSpec, PollItem, PollItemId, PolledFd};
use crate::ring::Ring;

/// Function pointer a caller hands to [`DataLoop::invoke`]. Parameters are
/// the loop handle, whether the call was deferred (`true`) or ran
/// synchronously on the loop thread (`false`), the caller's sequence
/// number, the payload, and the caller's opaque user data.
pub type InvokeFn = fn(&DataLoop, bool, Option<u32>, &[u8], usize) -> i32;

/// What [`DataLoop::invoke`] returns to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// Ran on the loop thread; carries the callback's own return value.
    Sync(i32),
    /// Queued from another thread with a valid sequence number.
    Async(u32),
    /// Queued from another thread with no sequence number to report back.
    Queued,
}

enum JobKind {
    User {
        func: InvokeFn,
        seq: Option<u32>,
        user_data: usize,
    },
    Internal(Box<dyn FnOnce(&mut LoopState) + Send>),
}

struct QueuedItem {
    item_size: usize,
    payload_offset: usize,
    payload_len: usize,
    kind: JobKind,
}

struct Queue {
    ring: Ring,
    items: VecDeque<QueuedItem>,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            items: VecDeque::new(),
        }
    }

    fn push(&mut self, payload: &[u8], kind: JobKind) -> Result<usize> {
        let reservation = self.ring.reserve(payload.len())?;
        self.ring.write_payload(reservation.payload_offset, payload);
        self.items.push_back(QueuedItem {
            item_size: reservation.item_size,
            payload_offset: reservation.payload_offset,
            payload_len: payload.len(),
            kind,
        });
        Ok(reservation.item_size)
    }

    fn pop(&mut self) -> Option<(JobKind, Vec<u8>)> {
        let item = self.items.pop_front()?;
        let payload = self.ring.read_payload(item.payload_offset, item.payload_len).to_vec();
        self.ring.advance_read(item.item_size);
        Some((item.kind, payload))
    }
}

struct Entry {
    id: PollItemId,
    item: PollItem,
}

/// State exclusively owned by the data loop thread: the poll item table and
/// the derived `pollfd` array rebuilt whenever an item's fds change.
struct LoopState {
    entries: Vec<Entry>,
    rebuild: bool,
    pollfds: Vec<libc::pollfd>,
    /// `pollfds` index of each entry's first fd (offset by the wakeup fd at
    /// index 0); `None` for entries with no fds.
    idx: Vec<Option<usize>>,
}

impl LoopState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            rebuild: false,
            pollfds: Vec::new(),
            idx: Vec::new(),
        }
    }

    fn add(&mut self, id: PollItemId, item: PollItem) {
        let needs_rebuild = !item.fds.is_empty();
        self.entries.push(Entry { id, item });
        if needs_rebuild {
            self.rebuild = true;
        }
    }

    fn update(&mut self, id: PollItemId, item: PollItem) {
        let needs_rebuild = !item.fds.is_empty();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.item = item;
        }
        if needs_rebuild {
            self.rebuild = true;
        }
    }

    fn remove(&mut self, id: PollItemId) {
        let mut had_fds = false;
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            had_fds = !self.entries[pos].item.fds.is_empty();
            self.entries.remove(pos);
        }
        if had_fds {
            self.rebuild = true;
        }
    }
}

struct Shared {
    queue: Mutex<Queue>,
    waker: crate::waker::Waker,
    running: AtomicBool,
    next_poll_id: AtomicU32,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: Mutex<Option<ThreadId>>,
}

/// The real-time data loop. Cloning shares the same underlying thread and
/// invoke queue; the thread itself starts lazily on the first `add_item`
/// and stops once the last item is removed.
#[derive(Clone)]
pub struct DataLoop {
    shared: Arc<Shared>,
}

/// Bytes reserved for the invoke queue's payload arena when none is given.
pub const DEFAULT_RING_CAPACITY: usize = 32 * 1024;

impl DataLoop {
    pub fn new(ring_capacity: usize) -> Result<Self> {
        Ok(Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue::new(ring_capacity)),
                waker: crate::waker::Waker::new()?,
                running: AtomicBool::new(false),
                next_poll_id: AtomicU32::new(1),
                thread: Mutex::new(None),
                thread_id: Mutex::new(None),
            }),
        })
    }

    fn on_loop_thread(&self) -> bool {
        *self.shared.thread_id.lock() == Some(std::thread::current().id())
    }

    /// Register a new poll item, returning its assigned id. Starts the
    /// thread if this is the first registration.
    pub fn add_item(&self, item: PollItem) -> Result<PollItemId> {
        let id = self.shared.next_poll_id.fetch_add(1, Ordering::SeqCst);
        debug!(id, "data loop: add_item");
        self.enqueue_internal(move |state| state.add(id, item))?;
        self.shared.waker.wake()?;
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.start_thread()?;
        }
        Ok(id)
    }

    pub fn update_item(&self, id: PollItemId, item: PollItem) -> Result<()> {
        debug!(id, "data loop: update_item");
        self.enqueue_internal(move |state| state.update(id, item))?;
        self.shared.waker.wake()
    }

    pub fn remove_item(&self, id: PollItemId) -> Result<()> {
        debug!(id, "data loop: remove_item");
        self.enqueue_internal(move |state| state.remove(id))?;
        self.shared.waker.wake()
    }

    fn enqueue_internal(&self, job: impl FnOnce(&mut LoopState) + Send + 'static) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        queue.push(&[], JobKind::Internal(Box::new(job)))?;
        Ok(())
    }

    /// Submit `func` to run against this loop. If called from the loop
    /// thread it runs immediately and its result is returned; otherwise it
    /// is queued and run on the next wakeup.
    pub fn invoke(
        &self,
        func: InvokeFn,
        seq: Option<u32>,
        payload: &[u8],
        user_data: usize,
    ) -> Result<InvokeOutcome> {
        if self.on_loop_thread() {
            return Ok(InvokeOutcome::Sync(func(self, false, seq, payload, user_data)));
        }
        {
            let mut queue = self.shared.queue.lock();
            queue.push(payload, JobKind::User { func, seq, user_data })?;
        }
        self.shared.waker.wake()?;
        Ok(match seq {
            Some(seq) => InvokeOutcome::Async(seq),
            None => InvokeOutcome::Queued,
        })
    }

    /// Spawn the loop thread. Callers must have already won the
    /// `running` compare-exchange so at most one thread is ever spawned
    /// per "stopped -> running" transition.
    fn start_thread(&self) -> Result<()> {
        let data_loop = self.clone();
        let handle = std::thread::Builder::new()
            .name("sg-data-loop".into())
            .spawn(move || run(data_loop))
            .map_err(Error::Resource)?;
        *self.shared.thread.lock() = Some(handle);
        Ok(())
    }

    /// Stop the loop thread. Joins the thread unless called from inside it.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let in_thread = self.on_loop_thread();
        if in_thread {
            return;
        }
        let _ = self.shared.waker.wake();
        if let Some(handle) = self.shared.thread.lock().take() {
            let _ = handle.join();
        }
        *self.shared.thread_id.lock() = None;
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

fn rebuild_pollfds(state: &mut LoopState, wakeup_fd: i32) {
    state.pollfds.clear();
    state.pollfds.push(libc::pollfd {
        fd: wakeup_fd,
        events: libc::POLLIN | libc::POLLPRI | libc::POLLERR,
        revents: 0,
    });
    state.idx.clear();
    for entry in &state.entries {
        if !entry.item.enabled || entry.item.fds.is_empty() {
            state.idx.push(None);
            continue;
        }
        state.idx.push(Some(state.pollfds.len()));
        for spec in &entry.item.fds {
            state.pollfds.push(spec_to_pollfd(spec));
        }
    }
    state.rebuild = false;
}

fn spec_to_pollfd(spec: &PollFdSpec) -> libc::pollfd {
    libc::pollfd {
        fd: spec.fd,
        events: spec.events,
        revents: 0,
    }
}

fn run(data_loop: DataLoop) {
    *data_loop.shared.thread_id.lock() = Some(std::thread::current().id());
    let wakeup_fd = data_loop.shared.waker.as_raw_fd();
    let mut state = LoopState::new();
    state.rebuild = true;

    debug!("data loop: enter thread");
    while data_loop.shared.running.load(Ordering::SeqCst) {
        for entry in &mut state.entries {
            if entry.item.enabled {
                if let Some(idle) = entry.item.idle.as_mut() {
                    if !idle() {
                        entry.item.enabled = false;
                    }
                }
            }
        }

        if state.rebuild {
            rebuild_pollfds(&mut state, wakeup_fd);
        }

        for entry in &mut state.entries {
            if entry.item.enabled {
                if let Some(before) = entry.item.before.as_mut() {
                    if !before() {
                        entry.item.enabled = false;
                    }
                }
            }
        }

        let r = unsafe {
            libc::poll(state.pollfds.as_mut_ptr(), state.pollfds.len() as libc::nfds_t, -1)
        };
        if r < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            warn!(error = %err, "data loop: poll failed");
            break;
        }
        if r == 0 {
            continue;
        }

        if state.pollfds[0].revents & libc::POLLIN != 0 {
            let _ = data_loop.shared.waker.drain();
            loop {
                let popped = {
                    let mut queue = data_loop.shared.queue.lock();
                    queue.pop()
                };
                let Some((kind, payload)) = popped else { break };
                match kind {
                    JobKind::Internal(job) => job(&mut state),
                    JobKind::User { func, seq, user_data } => {
                        let _ = func(&data_loop, true, seq, &payload, user_data);
                    }
                }
            }
            if state.entries.is_empty() {
                debug!("data loop: last poll item removed, stopping");
                data_loop.shared.running.store(false, Ordering::SeqCst);
            }
            continue;
        }

        for (i, entry) in state.entries.iter_mut().enumerate() {
            if !entry.item.enabled {
                continue;
            }
            let Some(after) = entry.item.after.as_mut() else { continue };
            let fds_empty = entry.item.fds.is_empty();
            let polled: Vec<PolledFd> = match state.idx[i] {
                Some(start) => state.pollfds[start..start + entry.item.fds.len()]
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
    }
    debug!("data loop: leave thread");
}

impl Drop for Shared {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.waker.wake();
            if let Some(handle) = self.thread.lock().take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
#[path = "data_loop_tests.rs"]
mod data_loop_tests;
