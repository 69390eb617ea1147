//! The driver binds configuration, initializes the engine, runs one (or,
//! in `loop` mode, repeated) benchmark pass, and prints the report.

use std::time::Instant;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::pool;
use crate::report::{self, PassStats};
use crate::signal;

/// Run the benchmark described by `config` to completion, printing the
/// seed line once and a report after every pass, and returning the stats of
/// the final pass. In `loop` mode this never returns on its own, it keeps
/// repeating until SIGINT is latched twice (which exits the process
/// directly) or a fatal error surfaces.
pub async fn run_benchmark(config: Config) -> Result<PassStats> {
    let local = tokio::task::LocalSet::new();
    local.run_until(run_benchmark_local(config)).await
}

async fn run_benchmark_local(config: Config) -> Result<PassStats> {
    report::print_seed(config.seed);

    let engine = Engine::new(config);
    let _sighup = signal::spawn_sighup_ignorer();
    let ctrlc = signal::spawn_ctrlc_watcher(engine.clone());

    let stats = loop {
        let start = Instant::now();
        pool::run(engine.clone()).await?;
        let stats = PassStats {
            issued: engine.issued(),
            elapsed: start.elapsed(),
            histogram: engine.histogram_snapshot(),
        };
        report::print_report(&stats, &engine.config);

        if !engine.config.loop_mode || engine.is_stopping() {
            break stats;
        }
        engine.reset_for_pass();
    };

    ctrlc.abort();
    Ok(stats)
}
