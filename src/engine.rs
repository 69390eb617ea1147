//! The engine ties configuration, RNG state, the op table and the
//! histogram together behind one handle shared by every client task.
//!
//! Deliberately `Rc`/`RefCell`, not `Arc`/`Mutex`: the whole benchmark runs
//! on a single `tokio` `current_thread` runtime, so there is never a second
//! thread that could contend for these cells, and `Engine` being `!Send`
//! encodes that at the type level.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Config;
use crate::distribution::{next_key, Prng};
use crate::histogram::Histogram;
use crate::optab::{Op, OpTab};

struct EngineState {
    histogram: Histogram,
    issued: u64,
    reserved: u64,
    optab: OpTab,
    prng: Prng,
    done: bool,
    stopping: bool,
    live: usize,
}

/// A cheaply-`Clone`able handle to the shared engine state; every client
/// task gets one.
#[derive(Clone)]
pub struct Engine {
    pub config: Rc<Config>,
    state: Rc<RefCell<EngineState>>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let optab = if config.idle {
            OpTab::idle()
        } else {
            OpTab::build(config.perc)
        };
        let prng = Prng::seeded(config.seed as u64);
        Engine {
            config: Rc::new(config),
            state: Rc::new(RefCell::new(EngineState {
                histogram: Histogram::new(),
                issued: 0,
                reserved: 0,
                optab,
                prng,
                done: false,
                stopping: false,
                live: 0,
            })),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    pub fn is_stopping(&self) -> bool {
        self.state.borrow().stopping
    }

    /// Latch the SIGINT-drain flag.
    pub fn set_stopping(&self) {
        self.state.borrow_mut().stopping = true;
    }

    /// Latch `done` immediately because a fatal protocol or integrity error
    /// was hit on some other slot; every other slot observes this at its next
    /// check and winds down without issuing further requests.
    pub fn signal_fatal(&self) {
        self.state.borrow_mut().done = true;
    }

    pub fn mark_connected(&self) {
        self.state.borrow_mut().live += 1;
    }

    pub fn mark_disconnected(&self) {
        let mut st = self.state.borrow_mut();
        st.live = st.live.saturating_sub(1);
    }

    pub fn live(&self) -> usize {
        self.state.borrow().live
    }

    /// Reserve the next request: a bucket draw picks the op, then the key
    /// (and hash field, for hash ops) are drawn from the configured
    /// distribution. Returns `None` once the request budget is exhausted or
    /// the engine has otherwise been marked done.
    ///
    /// Gated on a dedicated `reserved` counter rather than `issued`, and
    /// incremented here rather than in `complete_request`: a slot sits
    /// between this call and its matching `complete_request` for the whole
    /// round trip (`write_all`, then the reply read), so with `clients > 1`
    /// several slots can call this before any of them completes. Gating on
    /// `issued` would let all of them read the same stale value and overshoot
    /// the budget by up to `clients - 1`.
    pub fn next_request(&self) -> Option<(Op, u64, u64)> {
        let mut st = self.state.borrow_mut();
        if st.done || st.reserved >= self.config.requests {
            return None;
        }
        st.reserved += 1;
        let bucket = st.prng.below(100);
        let op = st.optab.sample(bucket);
        let k = next_key(
            &mut st.prng,
            self.config.keyspace,
            self.config.longtail,
            self.config.longtail_order,
        );
        let h = next_key(
            &mut st.prng,
            self.config.hash_keyspace,
            self.config.longtail,
            self.config.longtail_order,
        );
        Some((op, k, h))
    }

    /// Generate the payload bytes for a SET/LPUSH/HSET of key `k`, drawing
    /// on the shared general PRNG when `rand` mode needs a length.
    pub fn payload_for(&self, k: u64) -> Vec<u8> {
        let mut st = self.state.borrow_mut();
        crate::payload::generate(
            k,
            self.config.min_data_size,
            self.config.max_data_size,
            self.config.check,
            self.config.rand,
            &mut st.prng,
        )
    }

    /// Record one completed reply's latency and bump the issued counter,
    /// latching `done` once the configured budget is met.
    pub fn complete_request(&self, latency_ms: u64) {
        let mut st = self.state.borrow_mut();
        st.histogram.record(latency_ms);
        st.issued += 1;
        if st.issued >= self.config.requests {
            st.done = true;
        }
    }

    pub fn issued(&self) -> u64 {
        self.state.borrow().issued
    }

    pub fn histogram_snapshot(&self) -> Histogram {
        self.state.borrow().histogram.clone()
    }

    /// Zero the histogram, issued counter and reservation counter between
    /// `loop`-mode passes, without touching the PRNG sequence or the request
    /// budget, so successive passes are not bit-identical to one another.
    pub fn reset_for_pass(&self) {
        let mut st = self.state.borrow_mut();
        st.histogram.reset();
        st.issued = 0;
        st.reserved = 0;
        st.done = false;
    }
}
