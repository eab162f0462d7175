//! Register set representations.
//!
//! Registers are kept either in a sparse map holding only occupied registers, or in a dense
//! array with one byte per register. An estimator starts sparse (unless sparse representation is
//! too small to be useful) and is promoted to dense once the number of occupied registers exceeds
//! `sparse_max_elements`. Promotion is one-way.

use enum_dispatch::enum_dispatch;

use crate::dense::DenseRegisters;
use crate::sparse::SparseRegisters;

/// Representation types supported by `Estimator`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Sparse = 0,
    Dense = 1,
}

/// Register storage of an estimator
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch]
pub(crate) enum Registers {
    Sparse(SparseRegisters),
    Dense(DenseRegisters),
}

/// Register set trait which must be implemented by all representations.
#[enum_dispatch(Registers)]
pub(crate) trait RegisterSet {
    /// Return rank stored in register `idx`
    fn get(&self, idx: usize) -> u8;
    /// Raise register `idx` to `rank` if `rank` is larger than the stored one
    fn update(&mut self, idx: usize, rank: u8);
    /// Return number of registers with non-zero rank
    fn occupied(&self) -> usize;
    /// Return `(sum of 2^-rank, number of zero registers)` over all `m` registers
    fn harmonic_sum(&self, m: usize) -> (f64, usize);
    /// Return memory size of the register set
    fn size_of(&self) -> usize;
}

impl Registers {
    /// Create empty registers: sparse when it holds at least one element, dense otherwise
    pub(crate) fn new(m: usize, sparse_max_elements: usize) -> Self {
        if sparse_max_elements == 0 {
            Registers::Dense(DenseRegisters::new(m))
        } else {
            Registers::Sparse(SparseRegisters::default())
        }
    }

    /// Return representation type
    #[inline]
    pub(crate) fn representation(&self) -> Representation {
        match self {
            Registers::Sparse(_) => Representation::Sparse,
            Registers::Dense(_) => Representation::Dense,
        }
    }

    /// Convert sparse registers into dense ones, keeping dense registers as they are
    pub(crate) fn promote_to_dense(&mut self, m: usize) {
        if let Registers::Sparse(sparse) = self {
            let dense = sparse.to_dense(m);
            tracing::debug!(
                occupied = sparse.occupied(),
                m,
                "promoting sparse registers to dense"
            );
            *self = Registers::Dense(dense);
        }
    }

    /// Raise every register of `self` to the rank stored in `rhs`
    pub(crate) fn merge(&mut self, rhs: &Registers, m: usize, sparse_max_elements: usize) {
        if rhs.representation() == Representation::Dense {
            self.promote_to_dense(m);
        }
        match (&mut *self, rhs) {
            (Registers::Sparse(lhs), Registers::Sparse(rhs)) => lhs.merge(rhs),
            (Registers::Dense(lhs), Registers::Sparse(rhs)) => lhs.merge_sparse(rhs),
            (Registers::Dense(lhs), Registers::Dense(rhs)) => lhs.merge(rhs),
            // `self` has already been promoted
            (Registers::Sparse(_), Registers::Dense(_)) => {}
        }
        if self.representation() == Representation::Sparse && self.occupied() > sparse_max_elements
        {
            self.promote_to_dense(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(16, 0 => Representation::Dense; "no sparse headroom")]
    #[test_case(256, 7 => Representation::Sparse; "sparse headroom")]
    fn test_new(m: usize, sparse_max_elements: usize) -> Representation {
        Registers::new(m, sparse_max_elements).representation()
    }

    #[test]
    fn test_promote_to_dense_keeps_ranks() {
        let mut registers = Registers::new(256, 7);
        registers.update(3, 5);
        registers.update(200, 2);
        registers.promote_to_dense(256);
        assert_eq!(registers.representation(), Representation::Dense);
        assert_eq!(registers.get(3), 5);
        assert_eq!(registers.get(200), 2);
        assert_eq!(registers.get(4), 0);
        assert_eq!(registers.occupied(), 2);
    }

    #[test]
    fn test_merge_sparse_promotes_when_union_is_too_large() {
        let mut lhs = Registers::new(256, 7);
        let mut rhs = Registers::new(256, 7);
        for idx in 0..4 {
            lhs.update(idx, 1);
            rhs.update(idx + 4, 2);
        }
        lhs.merge(&rhs, 256, 7);
        assert_eq!(lhs.representation(), Representation::Dense);
        assert_eq!(lhs.occupied(), 8);
        assert_eq!(rhs.representation(), Representation::Sparse);
    }

    #[test]
    fn test_merge_dense_into_sparse() {
        let mut lhs = Registers::new(256, 7);
        lhs.update(1, 9);
        let mut rhs = Registers::new(256, 0);
        rhs.update(1, 3);
        rhs.update(2, 4);
        lhs.merge(&rhs, 256, 7);
        assert_eq!(lhs.representation(), Representation::Dense);
        assert_eq!(lhs.get(1), 9);
        assert_eq!(lhs.get(2), 4);
    }

    #[test]
    fn test_harmonic_sum_is_independent_of_representation() {
        let mut sparse = Registers::new(256, 100);
        let mut dense = Registers::new(256, 0);
        for (idx, rank) in [(0, 1), (17, 3), (255, 7), (17, 2)] {
            sparse.update(idx, rank);
            dense.update(idx, rank);
        }
        assert_eq!(sparse.harmonic_sum(256), dense.harmonic_sum(256));
        assert_eq!(sparse.harmonic_sum(256).1, 253);
    }
}
