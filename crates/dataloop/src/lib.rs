//! The real-time data loop and the control thread's cooperative main loop.
//!
//! This crate owns `poll(2)` multiplexing, the cross-thread invoke queue,
//! and the `eventfd` wakeup mechanism. Nothing above this layer reaches for
//! raw file descriptors directly; nodes and links only ever see
//! [`PollItem`] and [`DataLoop`]/[`MainLoop`] handles.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod data_loop;
pub mod error;
pub mod main_loop;
pub mod poll_item;
mod ring;
mod waker;

pub use data_loop::{DataLoop, InvokeFn, InvokeOutcome, DEFAULT_RING_CAPACITY};
pub use error::{Error, Result};
pub use main_loop::MainLoop;
pub use poll_item::{PollFdSpec, PollItem, PollItemId, PolledFd, READABLE, WRITABLE};
pub use waker::Waker;
