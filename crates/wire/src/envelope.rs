//! The client-node real-time/control envelope: a 4-byte big-endian length
//! prefix followed by a JSON payload, carrying a small tagged
//! `Command`/`Event` with an opaque body (§10.4). This is the only part
//! of the wire the data loop's poll-item callback needs to understand,
//! since it has to know how much to read off the socket before handing
//! the payload to the node implementation; the grammar inside the body is
//! a collaborator concern (§6).

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Server -> peer directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "body", rename_all = "kebab-case")]
pub enum Command {
    /// Negotiate/allocate/activate directives carry an opaque body; the
    /// concrete grammar belongs to the node implementation (§6).
    Generic(Value),
}

/// Peer -> server notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "body", rename_all = "kebab-case")]
pub enum Event {
    Generic(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    Command(Command),
    Event(Event),
}

/// Read one length-prefixed frame and decode it as an [`Envelope`].
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Envelope, FrameError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Encode `envelope` as JSON and write it length-prefixed.
pub fn write_frame<W: Write>(writer: &mut W, envelope: &Envelope) -> Result<(), FrameError> {
    let payload = serde_json::to_vec(envelope)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| FrameError::Io(io::Error::new(io::ErrorKind::InvalidInput, "frame too large")))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    Ok(())
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
