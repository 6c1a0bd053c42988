//! Exclusive checkout of malloc caches by simulated accessors.
//!
//! A cache models one core's hardware, so at most one accessor may use it at a
//! time. Holding a [`CacheGuard`] is the checkout; dropping it is the checkin.
//! The hit/miss sequence seen by a cache is therefore the lock acquisition order.

use crate::cache::MallocCache;
use crate::core::CacheId;
use crate::error::{Result, SimError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

pub type CacheGuard<'a> = MutexGuard<'a, MallocCache>;

/// Handle to one cache instance, cloneable across accessor threads.
#[derive(Clone, Debug)]
pub struct SharedCache {
    id: CacheId,
    inner: Arc<Mutex<MallocCache>>,
}

impl SharedCache {
    pub fn new(id: CacheId, cache: MallocCache) -> Self {
        Self {
            id,
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn id(&self) -> CacheId {
        self.id
    }

    /// Blocks until no other accessor holds this cache.
    pub fn checkout(&self) -> CacheGuard<'_> {
        self.inner.lock()
    }

    /// Returns the cache without blocking, or `None` while another accessor holds it.
    pub fn try_checkout(&self) -> Option<CacheGuard<'_>> {
        self.inner.try_lock()
    }
}

/// Independent cache instances, e.g. one per simulated core.
#[derive(Clone, Debug)]
pub struct CachePool {
    caches: Vec<SharedCache>,
}

impl CachePool {
    /// Builds `count` empty caches of `capacity` entries each.
    pub fn new(count: usize, capacity: usize) -> Result<Self> {
        if count == 0 {
            return Err(SimError::NoCaches);
        }
        let caches = (0..count)
            .map(|i| -> Result<SharedCache> {
                Ok(SharedCache::new(CacheId(i), MallocCache::new(capacity)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { caches })
    }

    pub fn get(&self, id: CacheId) -> Option<&SharedCache> {
        self.caches.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedCache> {
        self.caches.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SizeClass;
    use std::thread;

    #[test]
    fn checkout_is_exclusive() {
        let shared = SharedCache::new(CacheId(0), MallocCache::default());
        let guard = shared.checkout();
        assert!(shared.try_checkout().is_none());
        drop(guard);
        assert!(shared.try_checkout().is_some());
    }

    #[test]
    fn mutations_survive_checkin() {
        let shared = SharedCache::new(CacheId(0), MallocCache::new(2).unwrap());
        shared.checkout().insert_or_update(SizeClass(3));
        let other = shared.clone();
        assert_eq!(other.checkout().probe(SizeClass(3)), Some(0));
    }

    #[test]
    fn concurrent_accessors_never_duplicate_classes() {
        let shared = SharedCache::new(CacheId(0), MallocCache::new(4).unwrap());
        thread::scope(|s| {
            for t in 0..4usize {
                let shared = shared.clone();
                s.spawn(move || {
                    for i in 0..500usize {
                        let mut cache = shared.checkout();
                        let class = SizeClass((i + t) % 6);
                        if !cache.lookup(class).is_hit() {
                            cache.insert_or_update(class);
                        }
                    }
                });
            }
        });
        let cache = shared.checkout();
        let mut classes: Vec<_> = cache.entries().iter().filter_map(|e| e.class).collect();
        classes.sort();
        classes.dedup();
        assert_eq!(classes.len(), cache.len());
    }

    #[test]
    fn pool_builds_independent_caches() {
        let pool = CachePool::new(2, 4).unwrap();
        assert_eq!(pool.len(), 2);
        pool.get(CacheId(0)).unwrap().checkout().insert_or_update(SizeClass(1));
        assert!(pool.get(CacheId(1)).unwrap().checkout().is_empty());
        assert!(pool.get(CacheId(2)).is_none());
    }

    #[test]
    fn pool_rejects_bad_configuration() {
        assert!(matches!(CachePool::new(0, 4), Err(SimError::NoCaches)));
        assert!(matches!(CachePool::new(2, 0), Err(SimError::ZeroCapacity)));
    }
}
