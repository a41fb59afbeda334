//! The in-process publish/subscribe primitive used by the registry and by
//! every object that reports state changes.
//!
//! A [`Signal<T>`] is a single named notification channel carrying a
//! payload of type `T`. Subscribers are appended at the tail; emission
//! walks them in subscription order. Emission takes a snapshot of the
//! subscriber list under the lock and then calls out to each handler with
//! the lock released, so a handler is free to subscribe, unsubscribe, or
//! emit on any signal (including this one) without deadlocking. Because
//! the snapshot is taken before the first handler runs, an unsubscribe
//! triggered by a handler only takes effect for the *next* emission —
//! the handler being removed still finishes running in the current one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Opaque handle returned by [`Signal::subscribe`], used to [`Signal::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: SubscriptionId,
    handler: Handler<T>,
}

/// A single typed notification channel with ordered, synchronous dispatch.
pub struct Signal<T> {
    subscribers: Mutex<Vec<Subscriber<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Insert a handler at the tail of the subscriber list.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push(Subscriber {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a handler. If called from within an in-progress [`Signal::emit`]
    /// for this same signal, the removal is observed starting with the next
    /// emission, not the one in progress.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    /// Invoke every currently-subscribed handler, in subscription order,
    /// with `data`. Synchronous: returns once the last handler returns.
    pub fn emit(&self, data: &T) {
        let snapshot: Vec<Handler<T>> = {
            let subs = self.subscribers.lock();
            subs.iter().map(|s| s.handler.clone()).collect()
        };
        for handler in snapshot {
            handler(data);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
