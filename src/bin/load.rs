//! CLI entry point: a `structopt`-derived `Opt`, `tracing_subscriber::fmt::init()`,
//! and a thin `main()` that logs and exits on error, mirroring the teacher
//! binary's `main`/`run` split.

use anyhow::{Context, Result};
use structopt::StructOpt;

use kvperf::cli::Opt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opt = Opt::from_args();
    tracing_subscriber::fmt::init();

    if let Err(e) = run(opt).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(opt: Opt) -> Result<()> {
    let config = match opt.into_config() {
        Ok(config) => config,
        Err(e) => {
            Opt::clap().print_help(&mut std::io::stderr()).ok();
            eprintln!();
            return Err(e).context("invalid configuration");
        }
    };

    kvperf::run_benchmark(config).await.context("benchmark run failed")?;
    Ok(())
}
