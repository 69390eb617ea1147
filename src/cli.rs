//! `load`'s command-line surface: one `structopt`-derived struct with a doc
//! comment per field that doubles as `--help` text.

use std::time::{SystemTime, UNIX_EPOCH};

use structopt::StructOpt;

use crate::config::Config;
use crate::error::Error;
use crate::optab::OpPercentages;

#[derive(StructOpt, Debug)]
#[structopt(name = "load", about = "Load generator for RESP-speaking key-value servers")]
pub struct Opt {
    /// Server host
    #[structopt(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[structopt(long, default_value = "6379")]
    pub port: u16,

    /// Number of parallel connections
    #[structopt(long, default_value = "50")]
    pub clients: u32,

    /// Total number of requests to issue
    #[structopt(long, default_value = "10000")]
    pub requests: u64,

    /// Reuse connections across requests instead of reconnecting each time
    #[structopt(long, default_value = "1")]
    pub keepalive: u8,

    /// Minimum payload size in bytes
    #[structopt(long, default_value = "1")]
    pub mindatasize: u64,

    /// Maximum payload size in bytes
    #[structopt(long, default_value = "64")]
    pub maxdatasize: u64,

    /// Set both mindatasize and maxdatasize at once
    #[structopt(long)]
    pub datasize: Option<u64>,

    /// Primary keyspace size
    #[structopt(long, default_value = "100000")]
    pub keyspace: u64,

    /// Secondary (hash field) keyspace size
    #[structopt(long, default_value = "1000")]
    pub hashkeyspace: u64,

    /// PRNG seed; defaults to a value derived from the wall clock and pid
    #[structopt(long)]
    pub seed: Option<u32>,

    /// Percentage of requests that are SET (remainder is GET)
    #[structopt(long, default_value = "0")]
    pub set: u8,
    /// Percentage of requests that are DEL
    #[structopt(long, default_value = "0")]
    pub del: u8,
    /// Percentage of requests that are LPUSH
    #[structopt(long, default_value = "0")]
    pub lpush: u8,
    /// Percentage of requests that are LPOP
    #[structopt(long, default_value = "0")]
    pub lpop: u8,
    /// Percentage of requests that are HSET
    #[structopt(long, default_value = "0")]
    pub hset: u8,
    /// Percentage of requests that are HGET
    #[structopt(long, default_value = "0")]
    pub hget: u8,
    /// Percentage of requests that are HGETALL
    #[structopt(long, default_value = "0")]
    pub hgetall: u8,
    /// Percentage of requests that are DEBUG SWAPIN
    #[structopt(long, default_value = "0")]
    pub swapin: u8,

    /// Draw non-integrity payload lengths from the general PRNG instead of
    /// always using the max size
    #[structopt(long)]
    pub rand: bool,

    /// Verify every GET against a deterministic, key-addressed payload
    #[structopt(long)]
    pub check: bool,

    /// Use a power-law (long-tail) key access distribution
    #[structopt(long)]
    pub longtail: bool,

    /// Shaping order for --longtail, in [2, 100]
    #[structopt(long, default_value = "2")]
    pub longtailorder: u32,

    /// keyspace = requests = 1,000,000
    #[structopt(long)]
    pub big: bool,

    /// keyspace = requests = 10,000,000
    #[structopt(long)]
    pub verybig: bool,

    /// Only print the final requests-per-second line
    #[structopt(long)]
    pub quiet: bool,

    /// Repeat the benchmark pass indefinitely
    #[structopt(name = "loop", long)]
    pub loop_mode: bool,

    /// Open connections and never send a request (tests idle-connection handling)
    #[structopt(long)]
    pub idle: bool,

    /// Verbose debug logging
    #[structopt(long)]
    pub debug: bool,
}

impl Opt {
    /// Turn parsed flags into a validated [`Config`], applying `--big`,
    /// `--verybig` and `--datasize` sugar first.
    pub fn into_config(mut self) -> Result<Config, Error> {
        if self.big {
            self.keyspace = 1_000_000;
            self.requests = 1_000_000;
        }
        if self.verybig {
            self.keyspace = 10_000_000;
            self.requests = 10_000_000;
        }
        if let Some(size) = self.datasize {
            self.mindatasize = size;
            self.maxdatasize = size;
        }

        let seed = self.seed.unwrap_or_else(default_seed);

        Config::build(
            self.host,
            self.port,
            self.clients,
            self.requests,
            self.mindatasize,
            self.maxdatasize,
            self.keyspace,
            self.hashkeyspace,
            OpPercentages {
                set: self.set,
                del: self.del,
                lpush: self.lpush,
                lpop: self.lpop,
                hset: self.hset,
                hget: self.hget,
                hgetall: self.hgetall,
                swapin: self.swapin,
            },
            self.rand,
            self.check,
            self.longtail,
            self.longtailorder,
            self.keepalive != 0,
            self.idle,
            self.loop_mode,
            self.quiet,
            self.debug,
            seed,
        )
    }
}

/// Wall-clock XOR pid, used as the default PRNG seed when none is given on
/// the command line. May be zero if the mixer happens to land there,
/// harmless, and the actual seed used is always echoed to stdout.
fn default_seed() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(0);
    nanos ^ (std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_opt() -> Opt {
        Opt::from_iter(["load"])
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = base_opt().into_config().unwrap();
        assert_eq!(cfg.clients, 50);
        assert_eq!(cfg.requests, 10_000);
        assert_eq!(cfg.min_data_size, 1);
        assert_eq!(cfg.max_data_size, 64);
        assert_eq!(cfg.keyspace, 100_000);
        assert_eq!(cfg.hash_keyspace, 1_000);
        assert!(cfg.keepalive);
    }

    #[test]
    fn big_sets_keyspace_and_requests() {
        let opt = Opt::from_iter(["load", "--big"]);
        let cfg = opt.into_config().unwrap();
        assert_eq!(cfg.keyspace, 1_000_000);
        assert_eq!(cfg.requests, 1_000_000);
    }

    #[test]
    fn verybig_sets_keyspace_and_requests() {
        let opt = Opt::from_iter(["load", "--verybig"]);
        let cfg = opt.into_config().unwrap();
        assert_eq!(cfg.keyspace, 10_000_000);
        assert_eq!(cfg.requests, 10_000_000);
    }

    #[test]
    fn datasize_sets_both_bounds() {
        let opt = Opt::from_iter(["load", "--datasize", "128"]);
        let cfg = opt.into_config().unwrap();
        assert_eq!(cfg.min_data_size, 128);
        assert_eq!(cfg.max_data_size, 128);
    }

    #[test]
    fn explicit_seed_is_used_verbatim() {
        let opt = Opt::from_iter(["load", "--seed", "42"]);
        let cfg = opt.into_config().unwrap();
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn keepalive_zero_disables_reuse() {
        let opt = Opt::from_iter(["load", "--keepalive", "0"]);
        let cfg = opt.into_config().unwrap();
        assert!(!cfg.keepalive);
    }

    #[test]
    fn out_of_range_longtail_order_is_rejected() {
        let opt = Opt::from_iter(["load", "--longtail", "--longtailorder", "1"]);
        assert!(opt.into_config().is_err());
    }
}
