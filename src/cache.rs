//! Mallacc malloc cache model: a small fully associative store of recently used
//! size classes with LRU replacement.

use crate::core::SizeClass;
use crate::error::{Result, SimError};
use log::{debug, trace};

/// Entries in a malloc cache unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 16;

/// Result of looking a size class up in the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// `slot` matched after examining `scanned` occupied entries (the match included).
    Hit { slot: usize, scanned: usize },
    /// No entry matched; `scanned` occupied entries were examined.
    Miss { scanned: usize },
}

impl Lookup {
    pub fn scanned(&self) -> usize {
        match *self {
            Lookup::Hit { scanned, .. } | Lookup::Miss { scanned } => scanned,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit { .. })
    }
}

/// How [`MallocCache::insert_or_update`] placed a size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// Written into a previously empty slot.
    Inserted { slot: usize },
    /// Overwrote `victim`, the least recently used class.
    Evicted { slot: usize, victim: SizeClass },
    /// The class was already resident; only its recency changed.
    Refreshed { slot: usize },
}

/// One cache line: the size class it holds and when it was last touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// `None` while the line is unused.
    pub class: Option<SizeClass>,
    /// Clock stamp of the last access; 0 for a line that was never filled.
    pub last_used: u64,
}

impl CacheEntry {
    pub fn is_empty(&self) -> bool {
        self.class.is_none()
    }
}

/// Fixed-capacity malloc cache. Entries are scanned in slot order.
///
/// Recency is a global clock stamped into an occupied entry whenever it is
/// accessed or filled, so comparing stamps orders entries by true access
/// recency. Empty slots are always filled before any entry is evicted.
#[derive(Clone, Debug)]
pub struct MallocCache {
    entries: Vec<CacheEntry>,
    clock: u64,
}

impl Default for MallocCache {
    fn default() -> Self {
        Self {
            entries: vec![CacheEntry::default(); DEFAULT_CAPACITY],
            clock: 0,
        }
    }
}

impl MallocCache {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SimError::ZeroCapacity);
        }
        debug!("malloc cache created with {} entries", capacity);
        Ok(Self {
            entries: vec![CacheEntry::default(); capacity],
            clock: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of occupied entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(CacheEntry::is_empty)
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Scans occupied entries in slot order; the first match wins and becomes
    /// most recently used.
    pub fn lookup(&mut self, class: SizeClass) -> Lookup {
        let mut scanned = 0;
        let mut hit = None;
        for (slot, entry) in self.entries.iter().enumerate() {
            let Some(resident) = entry.class else {
                continue;
            };
            scanned += 1;
            if resident == class {
                hit = Some(slot);
                break;
            }
        }
        match hit {
            Some(slot) => {
                self.on_hit(slot);
                trace!("{} hit at slot {} after {} checks", class, slot, scanned);
                Lookup::Hit { slot, scanned }
            }
            None => {
                trace!("{} missed after {} checks", class, scanned);
                Lookup::Miss { scanned }
            }
        }
    }

    /// Slot holding `class`, without touching recency.
    pub fn probe(&self, class: SizeClass) -> Option<usize> {
        self.entries.iter().position(|e| e.class == Some(class))
    }

    /// Marks `slot` as the most recently used entry. Empty or out-of-range
    /// slots are ignored.
    pub fn on_hit(&mut self, slot: usize) {
        let Some(entry) = self.entries.get_mut(slot).filter(|e| !e.is_empty()) else {
            return;
        };
        self.clock += 1;
        entry.last_used = self.clock;
    }

    /// Slot to fill next: the lowest empty slot, otherwise the least recently
    /// used entry (lowest slot on ties).
    pub fn find_victim(&self) -> usize {
        if let Some(slot) = self.entries.iter().position(CacheEntry::is_empty) {
            return slot;
        }
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(slot, _)| slot)
            .unwrap_or(0)
    }

    /// Makes `class` resident and most recently used.
    pub fn insert_or_update(&mut self, class: SizeClass) -> Fill {
        if let Some(slot) = self.probe(class) {
            self.on_hit(slot);
            return Fill::Refreshed { slot };
        }
        let slot = self.find_victim();
        let previous = self.entries[slot].class.replace(class);
        self.on_hit(slot);
        match previous {
            Some(victim) => {
                trace!("{} evicted {} from slot {}", class, victim, slot);
                Fill::Evicted { slot, victim }
            }
            None => Fill::Inserted { slot },
        }
    }
}
