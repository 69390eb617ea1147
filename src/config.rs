//! Immutable run configuration.

use crate::error::Error;
use crate::optab::OpPercentages;

const MAX_PAYLOAD: u64 = 1 << 20;

/// Everything the engine needs to run one benchmark pass. Built once from
/// CLI flags (see `crate::cli`) and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub clients: u32,
    pub requests: u64,

    pub min_data_size: u64,
    pub max_data_size: u64,

    pub keyspace: u64,
    pub hash_keyspace: u64,

    pub perc: OpPercentages,

    pub rand: bool,
    pub check: bool,
    pub longtail: bool,
    pub longtail_order: u32,
    pub keepalive: bool,
    pub idle: bool,
    pub loop_mode: bool,
    pub quiet: bool,
    pub debug: bool,

    pub seed: u32,
}

impl Config {
    /// Clamp and validate raw fields into a usable `Config`: payload sizes
    /// to `[1, 2^20]`, keyspace and hash keyspace to `>= 1`, longtail order
    /// to `[2, 100]`.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        host: String,
        port: u16,
        clients: u32,
        requests: u64,
        min_data_size: u64,
        max_data_size: u64,
        keyspace: u64,
        hash_keyspace: u64,
        perc: OpPercentages,
        rand: bool,
        check: bool,
        longtail: bool,
        longtail_order: u32,
        keepalive: bool,
        idle: bool,
        loop_mode: bool,
        quiet: bool,
        debug: bool,
        seed: u32,
    ) -> Result<Config, Error> {
        if longtail && !(2..=100).contains(&longtail_order) {
            return Err(Error::Config(format!(
                "longtailorder must be in [2, 100], got {longtail_order}"
            )));
        }
        let min_data_size = min_data_size.clamp(1, MAX_PAYLOAD);
        let max_data_size = max_data_size.clamp(1, MAX_PAYLOAD).max(min_data_size);
        let keyspace = keyspace.max(1);
        let hash_keyspace = hash_keyspace.max(1);

        Ok(Config {
            host,
            port,
            clients,
            requests,
            min_data_size,
            max_data_size,
            keyspace,
            hash_keyspace,
            perc,
            rand,
            check,
            longtail,
            longtail_order,
            keepalive,
            idle,
            loop_mode,
            quiet,
            debug,
            seed,
        })
    }
}
