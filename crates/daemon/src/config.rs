//! Centralized environment variable access, mirroring the teacher's
//! `env.rs` pattern (§10.5). No config file format is mandated; everything
//! layers environment variables over a hardcoded default.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the control-plane's listening socket would be created
    /// in; the listener itself is a collaborator concern (§10.1).
    pub socket_dir: PathBuf,
    /// Bytes reserved for the data loop's invoke ring (§4.5).
    pub ring_capacity: usize,
    /// `tracing_subscriber::EnvFilter` directive string (§10.3).
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            socket_dir: socket_dir(),
            ring_capacity: ring_capacity(),
            log_filter: log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn socket_dir() -> PathBuf {
    std::env::var("SGD_SOCKET_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/run/sgd"))
}

fn ring_capacity() -> usize {
    std::env::var("SGD_RING_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(sg_dataloop::DEFAULT_RING_CAPACITY)
}

fn log_filter() -> String {
    std::env::var("SGD_LOG").unwrap_or_else(|_| "info".to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
