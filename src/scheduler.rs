//! Assignment of accessor threads to malloc caches.

use crate::core::{AccessorId, CacheId};
use crate::error::{Result, SimError};

/// How accessors share caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheSharing {
    /// Every accessor checks out the same cache.
    #[default]
    Shared,
    /// One cache per accessor, as with one thread pinned to each core.
    PerCore,
}

/// Round-robin mapping: accessor T uses cache T % caches.
#[derive(Clone, Copy, Debug)]
pub struct Scheduler {
    num_caches: usize,
    num_accessors: usize,
}

impl Scheduler {
    pub fn new(num_caches: usize, num_accessors: usize) -> Result<Self> {
        if num_accessors == 0 {
            return Err(SimError::NoAccessors);
        }
        if num_caches == 0 {
            return Err(SimError::NoCaches);
        }
        Ok(Self {
            num_caches,
            num_accessors,
        })
    }

    /// Scheduler for `num_accessors` threads under the given sharing mode.
    pub fn for_sharing(sharing: CacheSharing, num_accessors: usize) -> Result<Self> {
        let caches = match sharing {
            CacheSharing::Shared => 1,
            CacheSharing::PerCore => num_accessors,
        };
        Self::new(caches, num_accessors)
    }

    pub fn cache_for(&self, accessor: AccessorId) -> CacheId {
        CacheId(accessor.0 % self.num_caches)
    }

    /// Accessors contending for `cache`, in id order.
    pub fn accessors_of(&self, cache: CacheId) -> Vec<AccessorId> {
        (0..self.num_accessors)
            .map(AccessorId)
            .filter(|&a| self.cache_for(a) == cache)
            .collect()
    }

    pub fn num_caches(&self) -> usize {
        self.num_caches
    }

    pub fn num_accessors(&self) -> usize {
        self.num_accessors
    }
}
