//! ## Dense representation
//! Stores the rank of every one of the `m` registers in a byte array indexed directly by the
//! register index. Ranks never exceed `hash_bits + 1 <= 61`, so a byte per register is enough.

use std::mem::{size_of, size_of_val};

use crate::representation::RegisterSet;
use crate::sparse::SparseRegisters;

/// Dense representation container
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DenseRegisters {
    registers: Vec<u8>,
}

impl DenseRegisters {
    /// Create `m` zero registers
    #[inline]
    pub(crate) fn new(m: usize) -> Self {
        Self {
            registers: vec![0; m],
        }
    }

    /// Return register ranks
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.registers
    }

    /// Merge two dense representations of equal length
    #[inline]
    pub(crate) fn merge(&mut self, rhs: &DenseRegisters) {
        self.registers
            .iter_mut()
            .zip(rhs.registers.iter())
            .for_each(|(lhs, &rhs)| *lhs = (*lhs).max(rhs));
    }

    /// Merge occupied registers of a sparse representation
    #[inline]
    pub(crate) fn merge_sparse(&mut self, rhs: &SparseRegisters) {
        for (idx, rank) in rhs.iter() {
            self.update(idx, rank);
        }
    }
}

impl From<Vec<u8>> for DenseRegisters {
    /// Create new instance of `DenseRegisters` from given ranks
    #[inline]
    fn from(registers: Vec<u8>) -> Self {
        Self { registers }
    }
}

impl RegisterSet for DenseRegisters {
    #[inline]
    fn get(&self, idx: usize) -> u8 {
        self.registers[idx]
    }

    #[inline]
    fn update(&mut self, idx: usize, rank: u8) {
        let register = &mut self.registers[idx];
        *register = (*register).max(rank);
    }

    #[inline]
    fn occupied(&self) -> usize {
        self.registers.iter().filter(|&&rank| rank != 0).count()
    }

    fn harmonic_sum(&self, m: usize) -> (f64, usize) {
        debug_assert_eq!(m, self.registers.len());
        self.registers
            .iter()
            .fold((0.0, 0), |(sum, zeros), &rank| {
                (
                    sum + 2f64.powi(-i32::from(rank)),
                    zeros + usize::from(rank == 0),
                )
            })
    }

    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_takes_maximum() {
        let mut lhs = DenseRegisters::from(vec![0, 3, 1, 5]);
        let rhs = DenseRegisters::from(vec![2, 1, 1, 6]);
        lhs.merge(&rhs);
        assert_eq!(lhs.as_slice(), &[2, 3, 1, 6]);
    }

    #[test]
    fn test_merge_sparse() {
        let mut lhs = DenseRegisters::from(vec![0, 3, 1, 5]);
        let mut rhs = SparseRegisters::default();
        rhs.update(0, 4);
        rhs.update(1, 2);
        lhs.merge_sparse(&rhs);
        assert_eq!(lhs.as_slice(), &[4, 3, 1, 5]);
        assert_eq!(lhs.occupied(), 4);
    }

    #[test]
    fn test_harmonic_sum() {
        let dense = DenseRegisters::from(vec![0, 1, 2, 0]);
        assert_eq!(dense.harmonic_sum(4), (1.0 + 0.5 + 0.25 + 1.0, 2));
    }
}
