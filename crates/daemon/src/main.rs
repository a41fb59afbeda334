//! `sgd`: the daemon binary. Boots the composition root and drives the
//! control thread's main loop until killed; actual listener wiring (the
//! session-bus-shaped transport `sg-wire`'s envelope rides on) is a
//! collaborator concern per §10.1.

use sg_daemon::{Config, Daemon};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    sg_daemon::init_logging(&config.log_filter);

    let daemon = Daemon::new(&config)?;
    tracing::info!(socket_dir = %config.socket_dir.display(), "sgd starting");

    loop {
        daemon.main_loop.lock().iterate(Some(1000))?;
    }
}
