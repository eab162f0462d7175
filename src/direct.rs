//! ## Direct counter
//! Counts small cardinalities exactly by keeping every distinct raw hash. Once more than
//! `DIRECT_COUNTER_MAX_ELEMENTS` hashes have been seen the estimator discards the counter for good
//! and falls back to its registers.

use std::collections::HashSet;
use std::mem::size_of;

/// Maximum number of hashes kept for exact counting
pub const DIRECT_COUNTER_MAX_ELEMENTS: usize = 100;

/// Direct counter container
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DirectCounter {
    hashes: HashSet<u64>,
}

impl DirectCounter {
    /// Insert hash into the counter.
    /// Returns true while the counter stays within capacity, false otherwise.
    #[inline]
    pub(crate) fn insert(&mut self, hash: u64) -> bool {
        self.hashes.insert(hash);
        self.hashes.len() <= DIRECT_COUNTER_MAX_ELEMENTS
    }

    /// Return exact number of distinct hashes
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Union with hashes of `rhs`.
    ///
    /// The result is not checked against capacity, so a merged counter may exceed it and still
    /// report an exact count.
    pub(crate) fn merge(&mut self, rhs: &DirectCounter) {
        self.hashes.extend(rhs.hashes.iter().copied());
    }

    /// Return stored hashes in arbitrary order
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.hashes.iter().copied()
    }

    /// Return memory size of the counter
    pub(crate) fn size_of(&self) -> usize {
        size_of::<Self>() + self.hashes.capacity() * size_of::<u64>()
    }
}

impl FromIterator<u64> for DirectCounter {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_until_capacity() {
        let mut counter = DirectCounter::default();
        for hash in 0..DIRECT_COUNTER_MAX_ELEMENTS as u64 {
            assert!(counter.insert(hash));
        }
        // duplicates do not count
        assert!(counter.insert(0));
        assert_eq!(counter.len(), DIRECT_COUNTER_MAX_ELEMENTS);
        assert!(!counter.insert(u64::MAX));
    }

    #[test]
    fn test_merge_is_not_capped() {
        let mut lhs: DirectCounter = (0..80).collect();
        let rhs: DirectCounter = (40..140).collect();
        lhs.merge(&rhs);
        assert_eq!(lhs.len(), 140);
    }
}
