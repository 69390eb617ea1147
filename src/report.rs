//! Stdout report formatting.

use std::time::Duration;

use crate::config::Config;
use crate::histogram::Histogram;

/// Everything needed to print one pass's report.
pub struct PassStats {
    pub issued: u64,
    pub elapsed: Duration,
    pub histogram: Histogram,
}

impl PassStats {
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return self.issued as f64;
        }
        self.issued as f64 / secs
    }
}

/// Print one pass's report to stdout. In `quiet` mode only the final
/// requests-per-second line is printed.
pub fn print_report(stats: &PassStats, config: &Config) {
    if !config.quiet {
        println!(
            "{} requests completed in {:.2} seconds",
            stats.issued,
            stats.elapsed.as_secs_f64()
        );
        println!("{} parallel clients", config.clients);
        println!(
            "{}-{} byte payloads",
            config.min_data_size, config.max_data_size
        );
        println!(
            "keepalive: {}",
            if config.keepalive { "yes" } else { "no" }
        );
        for (ms, cumulative) in stats.histogram.cumulative() {
            let pct = cumulative as f64 * 100.0 / stats.issued.max(1) as f64;
            println!("{pct:.2}% <= {ms} milliseconds");
        }
    }
    println!("{:.2} requests per second", stats.requests_per_second());
}

/// Print the PRNG seed line once, at startup.
pub fn print_seed(seed: u32) {
    println!("PRNG seed is: {seed}");
}
