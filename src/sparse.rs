//! ## Sparse representation
//! Keeps only occupied registers in an ordered `index -> rank` map, absent indices have rank 0.
//! Used while the number of occupied registers stays within `sparse_max_elements`.

use std::collections::BTreeMap;
use std::mem::size_of;

use crate::dense::DenseRegisters;
use crate::representation::RegisterSet;

/// Sparse representation container
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SparseRegisters {
    registers: BTreeMap<u16, u8>,
}

impl SparseRegisters {
    /// Return occupied registers in ascending index order
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.registers
            .iter()
            .map(|(&idx, &rank)| (usize::from(idx), rank))
    }

    /// Return underlying `index -> rank` map
    #[inline]
    pub(crate) fn as_map(&self) -> &BTreeMap<u16, u8> {
        &self.registers
    }

    /// Union with `rhs` taking maximum rank per index
    pub(crate) fn merge(&mut self, rhs: &SparseRegisters) {
        for (idx, rank) in rhs.iter() {
            self.update(idx, rank);
        }
    }

    /// Copy occupied registers into a new dense representation
    pub(crate) fn to_dense(&self, m: usize) -> DenseRegisters {
        let mut dense = DenseRegisters::new(m);
        dense.merge_sparse(self);
        dense
    }
}

impl From<BTreeMap<u16, u8>> for SparseRegisters {
    /// Create new instance of `SparseRegisters` from given map
    #[inline]
    fn from(registers: BTreeMap<u16, u8>) -> Self {
        Self { registers }
    }
}

impl RegisterSet for SparseRegisters {
    #[inline]
    fn get(&self, idx: usize) -> u8 {
        self.registers.get(&(idx as u16)).copied().unwrap_or(0)
    }

    #[inline]
    fn update(&mut self, idx: usize, rank: u8) {
        if rank == 0 {
            return;
        }
        let entry = self.registers.entry(idx as u16).or_insert(rank);
        *entry = (*entry).max(rank);
    }

    #[inline]
    fn occupied(&self) -> usize {
        self.registers.len()
    }

    fn harmonic_sum(&self, m: usize) -> (f64, usize) {
        let zeros = m - self.registers.len();
        // every absent register contributes 2^0
        let sum = self
            .registers
            .values()
            .fold(zeros as f64, |sum, &rank| sum + 2f64.powi(-i32::from(rank)));
        (sum, zeros)
    }

    fn size_of(&self) -> usize {
        size_of::<Self>() + self.registers.len() * (size_of::<u16>() + size_of::<u8>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keeps_maximum() {
        let mut sparse = SparseRegisters::default();
        sparse.update(10, 3);
        sparse.update(10, 2);
        assert_eq!(sparse.get(10), 3);
        sparse.update(10, 7);
        assert_eq!(sparse.get(10), 7);
        assert_eq!(sparse.get(11), 0);
        assert_eq!(sparse.occupied(), 1);
    }

    #[test]
    fn test_merge_is_commutative() {
        let mut a = SparseRegisters::default();
        let mut b = SparseRegisters::default();
        a.update(1, 4);
        a.update(2, 1);
        b.update(2, 6);
        b.update(3, 2);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.iter().collect::<Vec<_>>(), vec![(1, 4), (2, 6), (3, 2)]);

        // merging again changes nothing
        let before = ab.clone();
        ab.merge(&b);
        assert_eq!(ab, before);
    }

    #[test]
    fn test_harmonic_sum() {
        let mut sparse = SparseRegisters::default();
        sparse.update(0, 1);
        sparse.update(5, 2);
        assert_eq!(sparse.harmonic_sum(16), (14.0 + 0.5 + 0.25, 14));
    }
}
