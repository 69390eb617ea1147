//! Flat cumulative latency histogram.

pub const MAX_MS: usize = 5000;

/// A flat array of `MAX_MS + 1` counters, one per millisecond bucket.
/// Latencies are clamped to `[0, MAX_MS]` before being recorded.
#[derive(Clone)]
pub struct Histogram {
    buckets: Vec<u64>,
}

impl Histogram {
    pub fn new() -> Self {
        Histogram {
            buckets: vec![0; MAX_MS + 1],
        }
    }

    /// Record one completed request's latency.
    pub fn record(&mut self, latency_ms: u64) {
        let idx = latency_ms.min(MAX_MS as u64) as usize;
        self.buckets[idx] += 1;
    }

    /// Total number of recorded completions.
    pub fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }

    /// Zero every bucket, for reuse across `loop` passes.
    pub fn reset(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = 0);
    }

    /// Iterate `(ms, cumulative_count)` for every bucket with a nonzero
    /// count, in ascending order of `ms`. `cumulative_count` is the running
    /// sum through and including this bucket.
    pub fn cumulative(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        let mut running = 0u64;
        self.buckets.iter().enumerate().filter_map(move |(ms, &c)| {
            if c == 0 {
                return None;
            }
            running += c;
            Some((ms, running))
        })
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
