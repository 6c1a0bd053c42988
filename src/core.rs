//! Core simulation units: cycles, size classes, and accessor/cache identities.

use std::fmt;

/// Abstract processor cycles charged to a simulated call.
pub type Cycle = u64;

/// Index of a size class as computed by [`crate::size_class::index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeClass(pub usize);

/// Identifies a simulated accessor (one driver thread).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessorId(pub usize);

/// Identifies one malloc cache instance (one simulated core's hardware).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheId(pub usize);

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.0)
    }
}

impl fmt::Display for AccessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(SizeClass(4).to_string(), "class 4");
        assert_eq!(AccessorId(2).to_string(), "thread-2");
        assert_eq!(CacheId(0).to_string(), "cache-0");
    }

    #[test]
    fn size_classes_order_by_index() {
        assert!(SizeClass(3) < SizeClass(4));
    }
}
