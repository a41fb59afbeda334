//! Error kinds surfaced by the data loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The invoke ring could not accept a payload of the requested size.
    #[error("queue full")]
    QueueFull,

    /// `poll(2)` returned an unrecoverable error (anything but `EINTR`).
    #[error("data loop poll failed: {0}")]
    Fatal(#[source] std::io::Error),

    /// Socket/eventfd allocation failed.
    #[error("resource allocation failed: {0}")]
    Resource(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
