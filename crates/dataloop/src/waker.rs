//! `eventfd`-backed waker used to kick the data loop thread out of `poll(2)`.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};

use crate::error::{Error, Result};

/// A single eventfd counter shared between whichever thread submits an
/// invoke item and the data loop thread blocked in `poll(2)`.
#[derive(Debug)]
pub struct Waker {
    fd: File,
}

impl Waker {
    pub fn new() -> Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd < 0 {
            return Err(Error::Resource(io::Error::last_os_error()));
        }
        let fd = unsafe { File::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    /// Add one to the eventfd counter, waking a blocked `poll(2)` call.
    #[allow(clippy::unused_io_amount)]
    pub fn wake(&self) -> Result<()> {
        let buf = 1u64.to_ne_bytes();
        match (&self.fd).write(&buf) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                self.drain()?;
                self.wake()
            }
            Err(err) => Err(Error::Fatal(err)),
        }
    }

    /// Reset the counter to zero after the loop thread observes `POLLIN`.
    #[allow(clippy::unused_io_amount)]
    pub fn drain(&self) -> Result<()> {
        let mut buf = [0u8; 8];
        match (&self.fd).read(&mut buf) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(Error::Fatal(err)),
        }
    }
}

impl AsRawFd for Waker {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
