//! Mallacc fast-path simulator: compares malloc cycle costs with and without the malloc cache.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mallacc_sim::cache::DEFAULT_CAPACITY;
use mallacc_sim::cost::CostModel;
use mallacc_sim::driver::{self, Comparison, RunConfig, SWEEP_CAPACITIES};
use mallacc_sim::scheduler::CacheSharing;
use mallacc_sim::workload::DEFAULT_ITERATIONS;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "mallacc-sim")]
#[command(about = "Estimate malloc fast-path cycles with and without a hardware malloc cache")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
    /// Entries per malloc cache.
    #[arg(long, default_value_t = DEFAULT_CAPACITY, global = true)]
    capacity: usize,
    /// Malloc/free pairs per thread.
    #[arg(long, default_value_t = DEFAULT_ITERATIONS, global = true)]
    iterations: usize,
    /// JSON cost table; missing fields keep the built-in costs.
    #[arg(long, global = true)]
    costs: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Every microbenchmark on one thread, assist off vs on.
    StSpeedup,
    /// Every microbenchmark on several threads.
    MtSpeedup {
        #[arg(long, default_value_t = 2)]
        threads: usize,
        /// Give each thread its own cache instead of sharing one.
        #[arg(long)]
        per_core: bool,
    },
    /// Same as mt-speedup for cache sizes 2 through 32.
    MtCacheSweep {
        #[arg(long, default_value_t = 2)]
        threads: usize,
        #[arg(long)]
        per_core: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_costs(path: Option<&Path>) -> Result<CostModel> {
    let Some(path) = path else {
        return Ok(CostModel::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading cost table {}", path.display()))?;
    CostModel::from_json(&text).with_context(|| format!("parsing cost table {}", path.display()))
}

fn sharing(per_core: bool) -> CacheSharing {
    if per_core {
        CacheSharing::PerCore
    } else {
        CacheSharing::Shared
    }
}

fn print_comparison(c: &Comparison) {
    println!(
        "{:<10} threads={:<3} entries={:<3} baseline={:>7.2} mallacc={:>7.2} \
         free={:>5.2} hit={:>6.2}% speedup={:.3}",
        c.config.benchmark,
        c.config.threads,
        c.config.capacity,
        c.baseline.mean_malloc_cycles(),
        c.assisted.mean_malloc_cycles(),
        c.assisted.mean_free_cycles(),
        c.assisted.hit_rate() * 100.0,
        c.speedup()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let costs = load_costs(cli.costs.as_deref())?;
    let base = RunConfig {
        capacity: cli.capacity,
        iterations: cli.iterations,
        ..RunConfig::default()
    };

    let results = match cli.mode {
        Mode::StSpeedup => driver::st_speedup(&base, &costs)?,
        Mode::MtSpeedup { threads, per_core } => {
            let config = RunConfig {
                threads,
                sharing: sharing(per_core),
                ..base
            };
            driver::mt_speedup(&config, &costs)?
        }
        Mode::MtCacheSweep { threads, per_core } => {
            let config = RunConfig {
                threads,
                sharing: sharing(per_core),
                ..base
            };
            driver::cache_sweep(&config, &costs, &SWEEP_CAPACITIES)?
        }
    };

    for comparison in &results {
        print_comparison(comparison);
    }
    Ok(())
}
