//! Allocation simulator: charges cycles for one malloc or free call against a malloc cache.

use crate::cache::{Fill, Lookup, MallocCache};
use crate::core::{Cycle, SizeClass};
use crate::cost::{CostModel, CostOp, CostParameters};
use crate::error::{Result, SimError};
use crate::size_class;
use log::trace;

/// Which code path a simulated malloc took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocPath {
    /// Assist disabled: software size lookup and software pop, no cache access.
    Software,
    /// The size class was cached at `slot`.
    Hit { slot: usize, scanned: usize },
    /// The size class was not cached; `fill` records where it was installed.
    Miss { scanned: usize, fill: Fill },
}

/// Cycles charged to one malloc plus how they were earned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocReport {
    pub cycles: Cycle,
    pub class: SizeClass,
    pub path: AllocPath,
}

/// Which code path a simulated free took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FreePath {
    /// Assist disabled; the push is part of unmodeled bookkeeping.
    Software,
    /// The class is resident, so the cached head and next pointers are updated.
    CachedHead { slot: usize },
    /// Assist enabled but the class is not resident.
    Uncached,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeReport {
    pub cycles: Cycle,
    pub class: SizeClass,
    pub path: FreePath,
}

/// Charges fast-path calls using one [`CostModel`]. The cache is owned by the
/// caller and lent for the duration of each call.
#[derive(Clone, Debug, Default)]
pub struct AllocationSimulator {
    costs: CostModel,
}

impl AllocationSimulator {
    pub fn new(costs: CostModel) -> Self {
        Self { costs }
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// Cycles for a malloc of `size` bytes.
    pub fn allocate(
        &self,
        size: usize,
        assist_enabled: bool,
        cache: &mut MallocCache,
    ) -> Result<Cycle> {
        self.allocate_traced(size, assist_enabled, cache).map(|r| r.cycles)
    }

    /// Cycles for a free of `size` bytes.
    pub fn deallocate(
        &self,
        size: usize,
        assist_enabled: bool,
        cache: &mut MallocCache,
    ) -> Result<Cycle> {
        self.deallocate_traced(size, assist_enabled, cache).map(|r| r.cycles)
    }

    /// Like [`allocate`](Self::allocate) but also reports the path taken.
    ///
    /// A hit costs one range check per scanned entry plus the cached lookup and
    /// pop. On a miss the hardware scan overlaps the software size-class
    /// computation, so only the longer of the two is charged, followed by the
    /// software pop and the cost of installing the class (update for an empty
    /// slot, evict when a live entry is displaced).
    pub fn allocate_traced(
        &self,
        size: usize,
        assist_enabled: bool,
        cache: &mut MallocCache,
    ) -> Result<AllocReport> {
        let class = validated_class(size)?;
        let params = self.costs.params(assist_enabled);
        if !assist_enabled {
            return Ok(AllocReport {
                cycles: params.software_path(),
                class,
                path: AllocPath::Software,
            });
        }

        let report = match cache.lookup(class) {
            Lookup::Hit { slot, scanned } => AllocReport {
                cycles: scan_cost(params, scanned)
                    .saturating_add(params.get(CostOp::SizeClassLookup))
                    .saturating_add(params.get(CostOp::PopHeadHit)),
                class,
                path: AllocPath::Hit { slot, scanned },
            },
            Lookup::Miss { scanned } => {
                let fill = cache.insert_or_update(class);
                let fill_cost = match fill {
                    Fill::Inserted { .. } => params.get(CostOp::CacheInsert),
                    Fill::Refreshed { .. } => params.get(CostOp::CacheUpdate),
                    Fill::Evicted { .. } => params.get(CostOp::CacheEvict),
                };
                let resolve =
                    scan_cost(params, scanned).max(params.get(CostOp::SoftwareSizeLookup));
                AllocReport {
                    cycles: resolve
                        .saturating_add(params.get(CostOp::PopHeadMiss))
                        .saturating_add(fill_cost),
                    class,
                    path: AllocPath::Miss { scanned, fill },
                }
            }
        };
        trace!("malloc({}) -> {} cycles via {:?}", size, report.cycles, report.path);
        Ok(report)
    }

    /// Like [`deallocate`](Self::deallocate) but also reports the path taken.
    /// Only a resident class is charged; recency is left untouched.
    pub fn deallocate_traced(
        &self,
        size: usize,
        assist_enabled: bool,
        cache: &mut MallocCache,
    ) -> Result<FreeReport> {
        let class = validated_class(size)?;
        if !assist_enabled {
            return Ok(FreeReport {
                cycles: 0,
                class,
                path: FreePath::Software,
            });
        }
        let report = match cache.probe(class) {
            Some(slot) => FreeReport {
                cycles: self.costs.cost_of(CostOp::HeadPush, true),
                class,
                path: FreePath::CachedHead { slot },
            },
            None => FreeReport {
                cycles: 0,
                class,
                path: FreePath::Uncached,
            },
        };
        trace!("free({}) -> {} cycles via {:?}", size, report.cycles, report.path);
        Ok(report)
    }
}

fn validated_class(size: usize) -> Result<SizeClass> {
    if size == 0 {
        return Err(SimError::InvalidSize { size });
    }
    Ok(size_class::index(size))
}

fn scan_cost(params: &CostParameters, scanned: usize) -> Cycle {
    params.get(CostOp::RangeCheck).saturating_mul(scanned as Cycle)
}
