//! Error kinds surfaced by the daemon composition root (§7, §10.2).

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] sg_core::Error),

    #[error(transparent)]
    DataLoop(#[from] sg_dataloop::Error),

    #[error("resource allocation failed: {0}")]
    Resource(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::Core(sg_core::Error::NotFound(message.into()))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Core(sg_core::Error::Invalid(message.into()))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
