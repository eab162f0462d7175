//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset and is defined with `index_bits` parameter `b` in [4..16] range,
//! which defines number of hash bits used for HyperLogLog register indices.
//!
//! # Data-structure design rationale
//!
//! ## Exact small cardinalities
//! Up to `DIRECT_COUNTER_MAX_ELEMENTS` (100) distinct hashes are kept verbatim and counted
//! exactly. Registers are updated in parallel, so when the direct counter overflows and is
//! discarded the estimator continues seamlessly from its registers.
//!
//! ## Low memory footprint
//! Registers start in sparse representation keeping only occupied registers, and switch to
//! dense representation (one byte per register) once more than `m / 15 - 10` registers are
//! occupied. For `b < 8` sparse representation would never pay off and dense is used from the
//! start.
//!
//! ## High accuracy
//! - Raw HyperLogLog estimate in `[0..5m]` range is corrected using empirical bias data.
//! - Linear counting over empty registers is used below a per-accuracy threshold.
//! - Expected error for large cardinalities:
//!     b = 4:  1.04 / sqrt(2^4)  = 26%
//!     b = 12: 1.04 / sqrt(2^12) = 1.62%
//!     b = 14: 1.04 / sqrt(2^14) = 0.81%
//!     b = 16: 1.04 / sqrt(2^16) = 0.41%

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use wyhash::WyHash;

use crate::bias::BiasTable;
use crate::config::Config;
use crate::direct::{DirectCounter, DIRECT_COUNTER_MAX_ELEMENTS};
use crate::error::{Error, Result};
use crate::hash::{index, rank};
use crate::representation::{RegisterSet, Registers, Representation};

pub struct Estimator<H: Hasher + Default = WyHash> {
    /// Immutable accuracy parameters
    pub(crate) config: Config,
    /// Sparse or dense registers
    pub(crate) registers: Registers,
    /// Exact counter, `None` once it overflowed
    pub(crate) direct: Option<DirectCounter>,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> Estimator<H> {
    /// Creates new instance of `Estimator` with `index_bits` in [4..16] range
    pub fn new(index_bits: u8) -> Result<Self> {
        Ok(Self::with_config(Config::new(index_bits)?))
    }

    /// Creates new instance of `Estimator` for the given configuration
    pub fn with_config(config: Config) -> Self {
        Self::from_parts(
            config,
            Registers::new(config.m, config.sparse_max_elements),
            Some(DirectCounter::default()),
        )
    }

    /// Creates new instance of `Estimator` meeting the requested standard error
    pub fn with_standard_error(standard_error: f64) -> Result<Self> {
        Ok(Self::with_config(Config::with_standard_error(standard_error)?))
    }

    pub(crate) fn from_parts(
        config: Config,
        registers: Registers,
        direct: Option<DirectCounter>,
    ) -> Self {
        Self {
            config,
            registers,
            direct,
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Return configuration of `Estimator`
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return representation type of `Estimator`
    #[inline]
    pub fn representation(&self) -> Representation {
        self.registers.representation()
    }

    /// Return whether cardinality is still counted exactly
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.direct.is_some()
    }

    /// Insert a hashable item into `Estimator`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.insert_hash(hash);
    }

    /// Insert hash into `Estimator`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        if let Some(direct) = &mut self.direct {
            if !direct.insert(hash) {
                tracing::debug!(
                    max_elements = DIRECT_COUNTER_MAX_ELEMENTS,
                    "direct counter overflowed, switching to estimation"
                );
                self.direct = None;
            }
        }

        let idx = index(hash, self.config.index_bits);
        let rank = rank(hash, self.config.hash_bits);
        self.registers.update(idx, rank);

        if self.registers.representation() == Representation::Sparse
            && self.registers.occupied() > self.config.sparse_max_elements
        {
            self.registers.promote_to_dense(self.config.m);
        }
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> usize {
        self.estimate_with_bias_table(&BiasTable::builtin(self.config.index_bits))
    }

    /// Return cardinality estimate using the given bias table for bias correction
    pub fn estimate_with_bias_table(&self, bias_table: &BiasTable<'_>) -> usize {
        if let Some(direct) = &self.direct {
            return direct.len();
        }

        let m = self.config.m as f64;
        let (z_inverse, zeros) = self.registers.harmonic_sum(self.config.m);

        let mut estimate = self.config.alpha_m * m * m / z_inverse;
        if estimate <= 5.0 * m {
            estimate = bias_table.correct(estimate);
        }

        let linear = if zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            estimate
        };

        if linear <= f64::from(self.config.linear_counting_threshold) {
            tracing::trace!(linear, zeros, "using linear counting estimate");
            linear.round() as usize
        } else {
            tracing::trace!(estimate, zeros, "using harmonic mean estimate");
            estimate.round() as usize
        }
    }

    /// Merge cardinality estimators.
    ///
    /// Fails without modifying `self` when `rhs` has a different number of registers.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        if rhs.config.m != self.config.m {
            return Err(Error::IncompatibleConfiguration {
                expected: self.config.m,
                found: rhs.config.m,
            });
        }

        self.registers.merge(
            &rhs.registers,
            self.config.m,
            self.config.sparse_max_elements,
        );

        match &rhs.direct {
            Some(rhs_direct) => {
                if let Some(direct) = &mut self.direct {
                    direct.merge(rhs_direct);
                }
            }
            None => {
                if self.direct.take().is_some() {
                    tracing::debug!("merged estimator is no longer exact");
                }
            }
        }

        Ok(())
    }

    /// Return new estimator holding the union of `lhs` and `rhs`, leaving both untouched
    pub fn merged(lhs: &Self, rhs: &Self) -> Result<Self> {
        let mut estimator = lhs.clone();
        estimator.merge(rhs)?;
        Ok(estimator)
    }

    /// Return memory size of `Estimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>()
            + self.registers.size_of()
            + self.direct.as_ref().map_or(0, DirectCounter::size_of)
    }
}

impl<H: Hasher + Default> Default for Estimator<H> {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<H: Hasher + Default> Clone for Estimator<H> {
    /// Clone `Estimator`
    fn clone(&self) -> Self {
        Self::from_parts(self.config, self.registers.clone(), self.direct.clone())
    }
}

impl<H: Hasher + Default> PartialEq for Estimator<H> {
    /// Compare estimators
    fn eq(&self, rhs: &Self) -> bool {
        self.config == rhs.config && self.registers == rhs.registers && self.direct == rhs.direct
    }
}

impl<H: Hasher + Default> Debug for Estimator<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ representation: {:?}, estimate: {}, size: {} }}",
            self.representation(),
            self.estimate(),
            self.size_of()
        )
    }
}
