//! Client pool: a fixed set of `N` slot tasks, each running the connection
//! state machine from [`crate::client`].
//!
//! Each slot owns its own reconnect loop: there is no moment where a slot
//! exists in the pool's bookkeeping without a task backing it, so there is
//! nothing to replace. `Engine::live()` reports the count of slot tasks that
//! haven't yet wound down for good.

use crate::client::run_slot;
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Spawn `engine.config.clients` slots on the current `LocalSet` and run
/// them to completion, returning the first fatal error encountered (if
/// any). Must be called from within a `tokio::task::LocalSet`.
pub async fn run(engine: Engine) -> Result<()> {
    let n = engine.config.clients;
    let mut handles = Vec::with_capacity(n as usize);
    for id in 0..n {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_local(run_slot(id as usize, engine)));
    }

    let mut fatal: Option<Error> = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, "fatal error, tearing down benchmark");
                if fatal.is_none() {
                    fatal = Some(e);
                }
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "client task panicked");
            }
        }
    }

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
