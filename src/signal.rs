//! Process signal handling.
//!
//! SIGPIPE needs no handling here: Rust's runtime already sets its
//! disposition to ignore at process start, and failed writes surface as an
//! ordinary `io::Error` (`EPIPE`) instead of a signal. SIGHUP does need an
//! explicit listener, since its default disposition is to terminate the
//! process, and a benchmark client losing its controlling terminal should
//! not be killed mid-run.

use crate::engine::Engine;

/// Spawn the SIGINT watcher: the first delivery latches the engine's
/// "stopping" flag so in-flight requests can drain and prints a drain
/// notice; a second delivery aborts the process immediately.
pub fn spawn_ctrlc_watcher(engine: Engine) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_local(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        engine.set_stopping();
        println!("Waiting for pending requests...");
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(1);
        }
    })
}

/// Spawn a listener that swallows SIGHUP for the life of the process.
#[cfg(unix)]
pub fn spawn_sighup_ignorer() -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_local(async move {
        let Ok(mut stream) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
        else {
            return;
        };
        loop {
            if stream.recv().await.is_none() {
                return;
            }
        }
    })
}

#[cfg(not(unix))]
pub fn spawn_sighup_ignorer() -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_local(async {})
}
