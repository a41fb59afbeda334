//! Structured logging setup (§10.3): `tracing` plus `tracing-subscriber`'s
//! `EnvFilter` layer, installed once at daemon startup, mirroring the
//! teacher's logging stack.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. A second call (e.g. from a
/// second test in the same process) is a no-op; `try_init`'s error is
/// swallowed rather than propagated since a harness installing its own
/// subscriber first is not this function's problem.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}
