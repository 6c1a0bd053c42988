//! Experiment driver: replays workloads from accessor threads against the
//! scheduled caches and aggregates the cycle counts.

use crate::cache::DEFAULT_CAPACITY;
use crate::core::AccessorId;
use crate::cost::CostModel;
use crate::error::{Result, SimError};
use crate::metrics::Metrics;
use crate::scheduler::{CacheSharing, Scheduler};
use crate::shared::{CachePool, SharedCache};
use crate::simulator::AllocationSimulator;
use crate::workload::{build_workload, Benchmark, Op, WorkloadGenerator, DEFAULT_ITERATIONS};
use log::{debug, info};
use std::panic;
use std::thread;

/// Cache capacities visited by a sweep.
pub const SWEEP_CAPACITIES: [usize; 5] = [2, 4, 8, 16, 32];

/// Parameters of one benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub benchmark: Benchmark,
    /// Entries per malloc cache.
    pub capacity: usize,
    /// Malloc/free pairs per accessor.
    pub iterations: usize,
    pub threads: usize,
    pub sharing: CacheSharing,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            benchmark: Benchmark::Tp,
            capacity: DEFAULT_CAPACITY,
            iterations: DEFAULT_ITERATIONS,
            threads: 1,
            sharing: CacheSharing::Shared,
        }
    }
}

/// The same run with the assist off and on.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub config: RunConfig,
    pub baseline: Metrics,
    pub assisted: Metrics,
}

impl Comparison {
    pub fn speedup(&self) -> f64 {
        self.assisted.speedup_over(&self.baseline)
    }
}

/// Runs `config` once with the given assist setting.
pub fn run_benchmark(
    config: &RunConfig,
    costs: &CostModel,
    assist_enabled: bool,
) -> Result<Metrics> {
    let scheduler = Scheduler::for_sharing(config.sharing, config.threads)?;
    let pool = CachePool::new(scheduler.num_caches(), config.capacity)?;
    let simulator = AllocationSimulator::new(*costs);
    let workloads = build_workload(config.threads, config.benchmark, config.iterations);
    debug!(
        "{}: {} accessors over {} caches of {} entries, assist={}",
        config.benchmark,
        config.threads,
        pool.len(),
        config.capacity,
        assist_enabled
    );
    for cache in pool.iter() {
        debug!("{} serves {:?}", cache.id(), scheduler.accessors_of(cache.id()));
    }

    let assignments = (0..config.threads)
        .map(|i| {
            let accessor = AccessorId(i);
            pool.get(scheduler.cache_for(accessor))
                .cloned()
                .map(|cache| (accessor, cache))
                .ok_or(SimError::NoCaches)
        })
        .collect::<Result<Vec<_>>>()?;

    let results: Vec<Result<Metrics>> = thread::scope(|s| {
        let handles: Vec<_> = assignments
            .into_iter()
            .zip(workloads)
            .map(|((accessor, cache), workload)| {
                let simulator = &simulator;
                s.spawn(move || replay(simulator, accessor, &cache, workload, assist_enabled))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    let mut metrics = Metrics::new();
    for result in results {
        metrics.merge(result?);
    }
    Ok(metrics)
}

/// One accessor's loop. The cache is checked out for each call and released
/// between calls so other accessors can interleave.
fn replay(
    simulator: &AllocationSimulator,
    accessor: AccessorId,
    cache: &SharedCache,
    workload: WorkloadGenerator,
    assist_enabled: bool,
) -> Result<Metrics> {
    let mut metrics = Metrics::new();
    for op in workload {
        let mut guard = cache.checkout();
        match op {
            Op::Malloc(size) => {
                let report = simulator.allocate_traced(size, assist_enabled, &mut guard)?;
                metrics.record_malloc(accessor, &report);
            }
            Op::Free(size) => {
                let report = simulator.deallocate_traced(size, assist_enabled, &mut guard)?;
                metrics.record_free(accessor, &report);
            }
        }
    }
    debug!("{} finished on {}", accessor, cache.id());
    Ok(metrics)
}

/// Runs `config` with the assist disabled, then enabled, on fresh caches.
pub fn compare(config: &RunConfig, costs: &CostModel) -> Result<Comparison> {
    let baseline = run_benchmark(config, costs, false)?;
    let assisted = run_benchmark(config, costs, true)?;
    let comparison = Comparison {
        config: *config,
        baseline,
        assisted,
    };
    info!(
        "{} x{} (capacity {}): {:.2} -> {:.2} cycles/malloc, hit rate {:.1}%",
        config.benchmark,
        config.threads,
        config.capacity,
        comparison.baseline.mean_malloc_cycles(),
        comparison.assisted.mean_malloc_cycles(),
        comparison.assisted.hit_rate() * 100.0
    );
    Ok(comparison)
}

/// Every benchmark, single accessor, assist off vs on.
pub fn st_speedup(config: &RunConfig, costs: &CostModel) -> Result<Vec<Comparison>> {
    let single = RunConfig {
        threads: 1,
        ..*config
    };
    speedup_all(&single, costs)
}

/// Every benchmark with `config.threads` accessors, assist off vs on.
pub fn mt_speedup(config: &RunConfig, costs: &CostModel) -> Result<Vec<Comparison>> {
    speedup_all(config, costs)
}

fn speedup_all(config: &RunConfig, costs: &CostModel) -> Result<Vec<Comparison>> {
    Benchmark::ALL
        .into_iter()
        .map(|benchmark| compare(&RunConfig { benchmark, ..*config }, costs))
        .collect()
}

/// [`mt_speedup`] repeated for each capacity in `capacities`.
pub fn cache_sweep(
    config: &RunConfig,
    costs: &CostModel,
    capacities: &[usize],
) -> Result<Vec<Comparison>> {
    let mut out = Vec::new();
    for &capacity in capacities {
        info!("sweep: capacity {}", capacity);
        out.extend(mt_speedup(&RunConfig { capacity, ..*config }, costs)?);
    }
    Ok(out)
}
