//! Metrics collection: cycles per malloc/free, cache hit/miss/eviction counts, speedup.

use crate::cache::Fill;
use crate::core::{AccessorId, Cycle};
use crate::simulator::{AllocPath, AllocReport, FreeReport};
use std::collections::HashMap;

/// Aggregate and per-accessor metrics for one run.
#[derive(Clone, Default, Debug)]
pub struct Metrics {
    pub malloc_calls: u64,
    pub free_calls: u64,
    pub malloc_cycles: Cycle,
    pub free_cycles: Cycle,
    /// Assisted mallocs whose size class was cached.
    pub cache_hits: u64,
    /// Assisted mallocs that fell back to the software path.
    pub cache_misses: u64,
    /// Misses that displaced another size class.
    pub evictions: u64,
    pub per_accessor: HashMap<AccessorId, AccessorMetrics>,
}

#[derive(Clone, Default, Debug)]
pub struct AccessorMetrics {
    pub malloc_calls: u64,
    pub free_calls: u64,
    pub malloc_cycles: Cycle,
    pub free_cycles: Cycle,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_malloc(&mut self, accessor: AccessorId, report: &AllocReport) {
        self.malloc_calls += 1;
        self.malloc_cycles += report.cycles;
        let per = self.per_accessor.entry(accessor).or_default();
        per.malloc_calls += 1;
        per.malloc_cycles += report.cycles;
        match report.path {
            AllocPath::Software => {}
            AllocPath::Hit { .. } => {
                self.cache_hits += 1;
                per.cache_hits += 1;
            }
            AllocPath::Miss { fill, .. } => {
                self.cache_misses += 1;
                per.cache_misses += 1;
                if matches!(fill, Fill::Evicted { .. }) {
                    self.evictions += 1;
                }
            }
        }
    }

    pub fn record_free(&mut self, accessor: AccessorId, report: &FreeReport) {
        self.free_calls += 1;
        self.free_cycles += report.cycles;
        let per = self.per_accessor.entry(accessor).or_default();
        per.free_calls += 1;
        per.free_cycles += report.cycles;
    }

    /// Folds another run's counts (e.g. another accessor thread) into this one.
    pub fn merge(&mut self, other: Metrics) {
        self.malloc_calls += other.malloc_calls;
        self.free_calls += other.free_calls;
        self.malloc_cycles += other.malloc_cycles;
        self.free_cycles += other.free_cycles;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.evictions += other.evictions;
        for (id, m) in other.per_accessor {
            let per = self.per_accessor.entry(id).or_default();
            per.malloc_calls += m.malloc_calls;
            per.free_calls += m.free_calls;
            per.malloc_cycles += m.malloc_cycles;
            per.free_cycles += m.free_cycles;
            per.cache_hits += m.cache_hits;
            per.cache_misses += m.cache_misses;
        }
    }

    /// Fraction of assisted mallocs that hit; 0 when the cache was never consulted.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }

    pub fn mean_malloc_cycles(&self) -> f64 {
        mean(self.malloc_cycles, self.malloc_calls)
    }

    pub fn mean_free_cycles(&self) -> f64 {
        mean(self.free_cycles, self.free_calls)
    }

    /// Baseline mean malloc cost divided by this run's mean malloc cost.
    pub fn speedup_over(&self, baseline: &Metrics) -> f64 {
        let ours = self.mean_malloc_cycles();
        if ours == 0.0 {
            return 0.0;
        }
        baseline.mean_malloc_cycles() / ours
    }
}

fn mean(cycles: Cycle, calls: u64) -> f64 {
    if calls == 0 {
        return 0.0;
    }
    cycles as f64 / calls as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SizeClass;
    use crate::simulator::FreePath;

    fn malloc(cycles: Cycle, path: AllocPath) -> AllocReport {
        AllocReport {
            cycles,
            class: SizeClass(1),
            path,
        }
    }

    #[test]
    fn empty_metrics() {
        let m = Metrics::new();
        assert_eq!(m.hit_rate(), 0.0);
        assert_eq!(m.mean_malloc_cycles(), 0.0);
        assert_eq!(m.speedup_over(&Metrics::new()), 0.0);
    }

    #[test]
    fn hit_miss_and_eviction_counts() {
        let mut m = Metrics::new();
        let a = AccessorId(0);
        m.record_malloc(a, &malloc(10, AllocPath::Hit { slot: 0, scanned: 1 }));
        m.record_malloc(a, &malloc(10, AllocPath::Hit { slot: 0, scanned: 1 }));
        m.record_malloc(
            a,
            &malloc(
                40,
                AllocPath::Miss {
                    scanned: 2,
                    fill: Fill::Evicted { slot: 1, victim: SizeClass(3) },
                },
            ),
        );
        assert_eq!(m.malloc_calls, 3);
        assert_eq!(m.evictions, 1);
        assert!((m.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!((m.mean_malloc_cycles() - 20.0).abs() < 1e-9);
        assert_eq!(m.per_accessor[&a].cache_hits, 2);
    }

    #[test]
    fn software_path_is_not_a_cache_access() {
        let mut m = Metrics::new();
        m.record_malloc(AccessorId(0), &malloc(6, AllocPath::Software));
        assert_eq!(m.cache_hits + m.cache_misses, 0);
    }

    #[test]
    fn merge_and_speedup() {
        let mut baseline = Metrics::new();
        baseline.record_malloc(AccessorId(0), &malloc(12, AllocPath::Software));

        let mut left = Metrics::new();
        left.record_malloc(AccessorId(0), &malloc(4, AllocPath::Hit { slot: 0, scanned: 1 }));
        let mut right = Metrics::new();
        right.record_malloc(AccessorId(1), &malloc(8, AllocPath::Hit { slot: 0, scanned: 2 }));
        right.record_free(
            AccessorId(1),
            &FreeReport {
                cycles: 3,
                class: SizeClass(1),
                path: FreePath::CachedHead { slot: 0 },
            },
        );
        left.merge(right);

        assert_eq!(left.malloc_calls, 2);
        assert_eq!(left.per_accessor.len(), 2);
        assert!((left.mean_free_cycles() - 3.0).abs() < 1e-9);
        assert!((left.speedup_over(&baseline) - 2.0).abs() < 1e-9);
    }
}
