//! Cycle-cost table for the primitive operations of the malloc fast path.

use crate::core::Cycle;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Primitive operations charged by the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CostOp {
    /// Compare the request against one occupied cache entry.
    RangeCheck,
    /// Read size class and allocation size from a hit entry (mcszlookup).
    SizeClassLookup,
    /// Overwrite a live entry's contents (mcszupdate on a resident line).
    CacheUpdate,
    /// Fill an empty entry. Charged at the update rate.
    CacheInsert,
    /// Fill an entry by displacing another size class. Charged in place of the update.
    CacheEvict,
    /// Pop the cached free-list head and prefetch the next pointer.
    PopHeadHit,
    /// Pop the free-list head in software.
    PopHeadMiss,
    /// Full software size-class computation.
    SoftwareSizeLookup,
    /// Push a freed pointer and refresh the cached head (mchdpush).
    HeadPush,
}

/// Named cycle costs for one configuration of the fast path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParameters {
    pub range_check: Cycle,
    pub size_class_lookup: Cycle,
    pub cache_update: Cycle,
    pub cache_evict: Cycle,
    pub pop_head_hit: Cycle,
    pub pop_head_miss: Cycle,
    pub software_size_lookup: Cycle,
    pub head_push: Cycle,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            range_check: 5,
            size_class_lookup: 2,
            cache_update: 2,
            cache_evict: 2,
            pop_head_hit: 3,
            pop_head_miss: 3,
            software_size_lookup: 3,
            head_push: 3,
        }
    }
}

impl CostParameters {
    pub fn get(&self, op: CostOp) -> Cycle {
        match op {
            CostOp::RangeCheck => self.range_check,
            CostOp::SizeClassLookup => self.size_class_lookup,
            CostOp::CacheUpdate | CostOp::CacheInsert => self.cache_update,
            CostOp::CacheEvict => self.cache_evict,
            CostOp::PopHeadHit => self.pop_head_hit,
            CostOp::PopHeadMiss => self.pop_head_miss,
            CostOp::SoftwareSizeLookup => self.software_size_lookup,
            CostOp::HeadPush => self.head_push,
        }
    }

    /// Cost of the unassisted path: software size lookup plus software pop.
    /// Sums saturate, since tables may come from user JSON.
    pub fn software_path(&self) -> Cycle {
        self.software_size_lookup.saturating_add(self.pop_head_miss)
    }
}

/// The two parameter sets, selected per call by the assist flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub disabled: CostParameters,
    pub enabled: CostParameters,
}

impl CostModel {
    /// Uses the same table whether or not the assist is enabled.
    pub fn uniform(params: CostParameters) -> Self {
        Self {
            disabled: params,
            enabled: params,
        }
    }

    pub fn params(&self, assist_enabled: bool) -> &CostParameters {
        if assist_enabled {
            &self.enabled
        } else {
            &self.disabled
        }
    }

    pub fn cost_of(&self, op: CostOp, assist_enabled: bool) -> Cycle {
        self.params(assist_enabled).get(op)
    }

    /// Parses a JSON cost table. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
