//! Size-class mapping: request bytes to a TCMalloc-style class index.
//!
//! The closed-form two-regime formula is the source of truth for indexing.
//! [`SIZE_CLASS_TABLE`] lists the allocation sizes of the first classes and is
//! used for display only.

use crate::core::SizeClass;

/// Largest request served by the 8-byte-granularity regime.
pub const MAX_SMALL_SIZE: usize = 1024;

const SMALL_BIAS: usize = 7;
const SMALL_SHIFT: u32 = 3;
const LARGE_BIAS: usize = 15487;
const LARGE_SHIFT: u32 = 7;

/// Allocation size in bytes of the leading size classes. Entry `i` is class `i`;
/// class 0 is reserved for zero-byte requests.
pub const SIZE_CLASS_TABLE: [usize; 9] = [0, 8, 16, 24, 32, 40, 48, 56, 64];

/// Maps a request size to its size class.
///
/// Small requests (`size <= 1024`) are bucketed at 8 bytes: `(size + 7) >> 3`.
/// Larger requests are bucketed at 128 bytes: `(size + 15487) >> 7`.
pub fn index(size: usize) -> SizeClass {
    if size > MAX_SMALL_SIZE {
        // (size + bias) >> 7 split so the addition cannot overflow near usize::MAX.
        let low = ((size & ((1 << LARGE_SHIFT) - 1)) + LARGE_BIAS) >> LARGE_SHIFT;
        SizeClass((size >> LARGE_SHIFT) + low)
    } else {
        SizeClass((size + SMALL_BIAS) >> SMALL_SHIFT)
    }
}

/// Allocation size of `class` if it is listed in [`SIZE_CLASS_TABLE`].
pub fn table_size(class: SizeClass) -> Option<usize> {
    SIZE_CLASS_TABLE.get(class.0).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_indices() {
        assert_eq!(index(1), SizeClass(1));
        assert_eq!(index(8), SizeClass(1));
        assert_eq!(index(9), SizeClass(2));
        assert_eq!(index(32), SizeClass(4));
        assert_eq!(index(1024), SizeClass(128));
        assert_eq!(index(1025), SizeClass(129));
        assert_eq!(index(4096), SizeClass(152));
    }

    #[test]
    fn large_regime_starts_after_class_128() {
        assert_eq!(index(1017), SizeClass(128));
        assert_eq!(index(1025), SizeClass(129));
        assert_eq!(index(1152), SizeClass(129));
        assert_eq!(index(1153), SizeClass(130));
    }

    #[test]
    fn huge_sizes_do_not_overflow() {
        let expected = ((usize::MAX as u128 + 15487) >> 7) as usize;
        assert_eq!(index(usize::MAX), SizeClass(expected));
    }

    #[test]
    fn table_agrees_with_formula() {
        for (class, &bytes) in SIZE_CLASS_TABLE.iter().enumerate().skip(1) {
            assert_eq!(index(bytes), SizeClass(class));
            assert_eq!(table_size(SizeClass(class)), Some(bytes));
        }
        assert_eq!(table_size(SizeClass(9)), None);
    }

    proptest! {
        #[test]
        fn small_regime_formula(size in 1usize..=1024) {
            prop_assert_eq!(index(size), SizeClass((size + 7) >> 3));
        }

        #[test]
        fn large_regime_formula(size in 1025usize..) {
            let expected = ((size as u128 + 15487) >> 7) as usize;
            prop_assert_eq!(index(size), SizeClass(expected));
        }

        #[test]
        fn index_is_monotonic(size in 1usize..1_000_000) {
            prop_assert!(index(size) <= index(size + 1));
        }
    }
}
