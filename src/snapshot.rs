//! # Snapshot of estimator state
//!
//! A `Snapshot` holds every field needed to restore an estimator with identical estimation
//! behaviour, in this order:
//! `index_bits`, `hash_bits`, `m`, `alpha_m`, `linear_counting_threshold`, dense registers,
//! sparse registers, `sparse_max_elements`, sparse flag, direct counter hashes.
//!
//! Exactly one of the two register forms is present, as selected by the sparse flag. Derived
//! constants are restored verbatim rather than recomputed, so a restored estimator returns the
//! same estimate as the one that produced the snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;

use crate::config::Config;
use crate::dense::DenseRegisters;
use crate::direct::DirectCounter;
use crate::error::{Error, Result};
use crate::estimator::Estimator;
use crate::representation::Registers;
use crate::sparse::SparseRegisters;

/// Serializable state of an `Estimator`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub index_bits: u8,
    pub hash_bits: u8,
    pub m: usize,
    pub alpha_m: f64,
    pub linear_counting_threshold: u32,
    pub dense: Option<Vec<u8>>,
    pub sparse: Option<BTreeMap<u16, u8>>,
    pub sparse_max_elements: usize,
    pub is_sparse: bool,
    pub direct: Option<BTreeSet<u64>>,
}

impl<H: Hasher + Default> Estimator<H> {
    /// Return snapshot of the current state
    pub fn snapshot(&self) -> Snapshot {
        let (dense, sparse) = match &self.registers {
            Registers::Dense(dense) => (Some(dense.as_slice().to_vec()), None),
            Registers::Sparse(sparse) => (None, Some(sparse.as_map().clone())),
        };
        Snapshot {
            index_bits: self.config.index_bits,
            hash_bits: self.config.hash_bits,
            m: self.config.m,
            alpha_m: self.config.alpha_m,
            linear_counting_threshold: self.config.linear_counting_threshold,
            dense,
            sparse,
            sparse_max_elements: self.config.sparse_max_elements,
            is_sparse: matches!(self.registers, Registers::Sparse(_)),
            direct: self.direct.as_ref().map(|direct| direct.iter().collect()),
        }
    }

    /// Restore estimator from a snapshot, validating its consistency
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let config = Config::new(snapshot.index_bits)
            .map_err(|e| invalid(format!("index bits: {}", e)))?;
        if snapshot.hash_bits != config.hash_bits {
            return Err(invalid(format!(
                "hash bits {} do not match {} index bits",
                snapshot.hash_bits, snapshot.index_bits
            )));
        }
        if snapshot.m != config.m {
            return Err(invalid(format!(
                "register count {} does not match {} index bits",
                snapshot.m, snapshot.index_bits
            )));
        }
        if !snapshot.alpha_m.is_finite() || snapshot.alpha_m <= 0.0 {
            return Err(invalid(format!("alpha {}", snapshot.alpha_m)));
        }

        let max_rank = snapshot.hash_bits + 1;
        let registers = match (snapshot.is_sparse, snapshot.dense, snapshot.sparse) {
            (true, None, Some(sparse)) => {
                if sparse.len() > snapshot.sparse_max_elements {
                    return Err(invalid(format!(
                        "{} sparse registers exceed maximum of {}",
                        sparse.len(),
                        snapshot.sparse_max_elements
                    )));
                }
                let out_of_range = |(&idx, &rank): &(&u16, &u8)| {
                    usize::from(idx) >= snapshot.m || rank == 0 || rank > max_rank
                };
                if let Some((&idx, &rank)) = sparse.iter().find(out_of_range) {
                    return Err(invalid(format!("sparse register {} with rank {}", idx, rank)));
                }
                Registers::Sparse(SparseRegisters::from(sparse))
            }
            (false, Some(dense), None) => {
                if dense.len() != snapshot.m {
                    return Err(invalid(format!(
                        "{} dense registers, expected {}",
                        dense.len(),
                        snapshot.m
                    )));
                }
                if let Some(rank) = dense.iter().find(|&&rank| rank > max_rank) {
                    return Err(invalid(format!("dense register rank {}", rank)));
                }
                Registers::Dense(DenseRegisters::from(dense))
            }
            (is_sparse, dense, sparse) => {
                return Err(invalid(format!(
                    "sparse flag {} with dense registers {} and sparse registers {}",
                    is_sparse,
                    presence(dense.is_some()),
                    presence(sparse.is_some())
                )));
            }
        };

        let config = Config {
            alpha_m: snapshot.alpha_m,
            linear_counting_threshold: snapshot.linear_counting_threshold,
            sparse_max_elements: snapshot.sparse_max_elements,
            ..config
        };
        let direct = snapshot
            .direct
            .map(|hashes| hashes.into_iter().collect::<DirectCounter>());

        Ok(Self::from_parts(config, registers, direct))
    }
}

impl<H: Hasher + Default> TryFrom<Snapshot> for Estimator<H> {
    type Error = Error;

    fn try_from(snapshot: Snapshot) -> Result<Self> {
        Self::from_snapshot(snapshot)
    }
}

impl<H: Hasher + Default> From<&Estimator<H>> for Snapshot {
    fn from(estimator: &Estimator<H>) -> Self {
        estimator.snapshot()
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidSnapshot(message)
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "absent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::Representation;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    fn estimator(index_bits: u8, n: usize) -> Estimator {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let mut e = Estimator::new(index_bits).unwrap();
        for _ in 0..n {
            e.insert_hash(rng.gen());
        }
        e
    }

    #[test_case(14, 0 => Representation::Sparse; "empty")]
    #[test_case(14, 99 => Representation::Sparse; "under hundred")]
    #[test_case(14, 500 => Representation::Sparse; "sparse estimate")]
    #[test_case(14, 10_000 => Representation::Dense; "ten thousand")]
    #[test_case(4, 50 => Representation::Dense; "dense from start")]
    fn test_roundtrip(index_bits: u8, n: usize) -> Representation {
        let original = estimator(index_bits, n);
        let restored = Estimator::<wyhash::WyHash>::from_snapshot(original.snapshot()).unwrap();
        assert_eq!(restored.estimate(), original.estimate());
        assert_eq!(restored, original);
        assert_eq!(restored.snapshot(), original.snapshot());
        restored.representation()
    }

    #[test]
    fn test_snapshot_fields() {
        let snapshot = estimator(8, 3).snapshot();
        assert_eq!(snapshot.index_bits, 8);
        assert_eq!(snapshot.hash_bits, 56);
        assert_eq!(snapshot.m, 256);
        assert_eq!(snapshot.linear_counting_threshold, 220);
        assert_eq!(snapshot.sparse_max_elements, 7);
        assert!(snapshot.is_sparse);
        assert!(snapshot.dense.is_none());
        assert_eq!(snapshot.direct.map(|d| d.len()), Some(3));
    }

    #[test]
    fn test_restored_estimator_keeps_counting() {
        let mut original = estimator(12, 3_000);
        let mut restored = Estimator::<wyhash::WyHash>::try_from(original.snapshot()).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1_000 {
            let hash = rng.gen();
            original.insert_hash(hash);
            restored.insert_hash(hash);
        }
        assert_eq!(restored, original);
    }

    fn assert_invalid(snapshot: Snapshot) {
        let result = Estimator::<wyhash::WyHash>::from_snapshot(snapshot);
        assert!(
            matches!(result, Err(Error::InvalidSnapshot(_))),
            "unexpected {:?}",
            result
        );
    }

    #[test]
    fn test_both_register_forms() {
        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.dense = Some(vec![0; 16384]);
        assert_invalid(snapshot);
    }

    #[test]
    fn test_no_register_form() {
        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.sparse = None;
        assert_invalid(snapshot);
    }

    #[test]
    fn test_mode_flag_mismatch() {
        let mut snapshot = estimator(14, 10_000).snapshot();
        snapshot.is_sparse = true;
        assert_invalid(snapshot);
    }

    #[test]
    fn test_wrong_dense_length() {
        let mut snapshot = estimator(4, 10).snapshot();
        snapshot.dense = Some(vec![0; 15]);
        assert_invalid(snapshot);
    }

    #[test]
    fn test_inconsistent_configuration() {
        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.m = 4096;
        assert_invalid(snapshot);

        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.hash_bits = 48;
        assert_invalid(snapshot);

        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.index_bits = 20;
        assert_invalid(snapshot);

        let mut snapshot = estimator(14, 10).snapshot();
        snapshot.alpha_m = f64::NAN;
        assert_invalid(snapshot);
    }

    #[test]
    fn test_invalid_registers() {
        let mut snapshot = estimator(8, 0).snapshot();
        snapshot.sparse = Some(BTreeMap::from([(256, 1)]));
        assert_invalid(snapshot);

        let mut snapshot = estimator(8, 0).snapshot();
        snapshot.sparse = Some(BTreeMap::from([(1, 0)]));
        assert_invalid(snapshot);

        let mut snapshot = estimator(8, 0).snapshot();
        snapshot.sparse = Some((0..8).map(|idx| (idx, 1)).collect());
        assert_invalid(snapshot);

        let mut snapshot = estimator(4, 0).snapshot();
        snapshot.dense = Some(vec![62; 16]);
        assert_invalid(snapshot);
    }
}
