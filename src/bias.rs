//! Empirical bias correction of the raw harmonic mean estimate.
//!
//! For raw estimates up to `5 * m` the HyperLogLog estimator is noticeably biased. The bias is
//! looked up in a per-accuracy table of `(raw estimate, bias)` pairs and interpolated linearly
//! between the two neighbouring entries, so that the closer neighbour dominates.

use crate::bias_data::{BIASES, RAW_ESTIMATES};
use crate::config::{MAX_INDEX_BITS, MIN_INDEX_BITS};
use crate::error::{Error, Result};

/// Ascending `(raw estimate, bias)` pairs for a single accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasTable<'a> {
    estimates: &'a [f64],
    biases: &'a [f64],
}

impl BiasTable<'static> {
    /// Return built-in table for the given number of index bits
    pub fn for_index_bits(index_bits: u8) -> Result<Self> {
        if !(MIN_INDEX_BITS..=MAX_INDEX_BITS).contains(&index_bits) {
            return Err(Error::UnsupportedAccuracy(index_bits));
        }
        Ok(Self::builtin(index_bits))
    }

    /// Return built-in table for index bits already validated by `Config`
    #[inline]
    pub(crate) fn builtin(index_bits: u8) -> Self {
        let row = usize::from(index_bits - MIN_INDEX_BITS);
        Self {
            estimates: RAW_ESTIMATES[row],
            biases: BIASES[row],
        }
    }
}

impl<'a> BiasTable<'a> {
    /// Create table from raw estimates sorted in ascending order and their biases.
    ///
    /// Returns `None` when the slices are empty or differ in length.
    pub fn new(estimates: &'a [f64], biases: &'a [f64]) -> Option<Self> {
        if estimates.is_empty() || estimates.len() != biases.len() {
            return None;
        }
        Some(Self { estimates, biases })
    }

    /// Return bias expected at `raw_estimate`
    pub fn bias(&self, raw_estimate: f64) -> f64 {
        // first estimate not smaller than `raw_estimate`, scanned in table order since published
        // rows are not strictly ascending
        let upper = self
            .estimates
            .iter()
            .position(|&e| e >= raw_estimate)
            .unwrap_or(self.estimates.len());
        if upper == 0 {
            return self.biases[0];
        }
        if upper == self.estimates.len() {
            return self.biases[upper - 1];
        }
        if self.estimates[upper] == raw_estimate {
            return self.biases[upper];
        }

        let (lo_est, hi_est) = (self.estimates[upper - 1], self.estimates[upper]);
        let (lo_bias, hi_bias) = (self.biases[upper - 1], self.biases[upper]);
        lo_bias + (hi_bias - lo_bias) * (raw_estimate - lo_est) / (hi_est - lo_est)
    }

    /// Return `raw_estimate` with the expected bias removed, never below zero
    pub fn correct(&self, raw_estimate: f64) -> f64 {
        (raw_estimate - self.bias(raw_estimate)).max(0.0)
    }

    /// Number of `(raw estimate, bias)` pairs
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Return whether table has no entries
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}

/// Correct `raw_estimate` using the built-in bias table for `index_bits`.
pub fn correct_bias(raw_estimate: f64, index_bits: u8) -> Result<f64> {
    Ok(BiasTable::for_index_bits(index_bits)?.correct(raw_estimate))
}
