//! Estimator configuration derived from the number of index bits `b`.
//!
//! - `b` in [4..16] range defines the number of hash bits used for register indices.
//! - `m = 2^b` registers are kept, which bounds memory to roughly `m` bytes.
//! - For large cardinalities the standard error is `1.04 / sqrt(m)`:
//!   b = 4:  26.00%
//!   b = 12:  1.62%
//!   b = 14:  0.81%
//!   b = 16:  0.41%

use crate::error::{Error, Result};

/// Smallest supported number of index bits.
pub const MIN_INDEX_BITS: u8 = 4;
/// Largest supported number of index bits.
pub const MAX_INDEX_BITS: u8 = 16;
/// Number of index bits used by `Config::default()`.
pub const DEFAULT_INDEX_BITS: u8 = 14;

/// Linear counting thresholds for index bits in [4..16] range, from the supplementary material of
/// "HyperLogLog in Practice" (Heule, Nunkesser, Hall).
const LINEAR_COUNTING_THRESHOLDS: [u32; 13] = [
    10, 20, 40, 80, 220, 400, 900, 1800, 3100, 6500, 11500, 20000, 50000,
];

/// Immutable parameters of an estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub(crate) index_bits: u8,
    pub(crate) hash_bits: u8,
    pub(crate) m: usize,
    pub(crate) alpha_m: f64,
    pub(crate) linear_counting_threshold: u32,
    pub(crate) sparse_max_elements: usize,
}

impl Config {
    /// Creates configuration for the given number of index bits.
    pub fn new(index_bits: u8) -> Result<Self> {
        if !(MIN_INDEX_BITS..=MAX_INDEX_BITS).contains(&index_bits) {
            return Err(Error::UnsupportedAccuracy(index_bits));
        }
        Ok(Self::from_valid_index_bits(index_bits))
    }

    /// Derive all constants from `index_bits` already known to lie in [4..16] range
    fn from_valid_index_bits(index_bits: u8) -> Self {
        let m = 1usize << index_bits;
        Self {
            index_bits,
            hash_bits: 64 - index_bits,
            m,
            alpha_m: alpha(m),
            linear_counting_threshold: LINEAR_COUNTING_THRESHOLDS
                [usize::from(index_bits - MIN_INDEX_BITS)],
            sparse_max_elements: sparse_max_elements(m),
        }
    }

    /// Creates configuration with the smallest number of index bits whose standard error does not
    /// exceed `standard_error`, clamped into the supported range.
    pub fn with_standard_error(standard_error: f64) -> Result<Self> {
        let sqrt_m = 1.04 / standard_error;
        let bits = (sqrt_m * sqrt_m).log2().ceil();
        let bits = if bits.is_nan() {
            MAX_INDEX_BITS
        } else {
            bits.clamp(f64::from(MIN_INDEX_BITS), f64::from(MAX_INDEX_BITS)) as u8
        };
        Self::new(bits)
    }

    /// Number of bits used for register indices.
    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// Number of bits left for rank computation.
    pub fn hash_bits(&self) -> u8 {
        self.hash_bits
    }

    /// Number of registers.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Bias constant of the harmonic mean estimator.
    pub fn alpha_m(&self) -> f64 {
        self.alpha_m
    }

    /// Largest linear counting estimate that is preferred over the harmonic mean estimate.
    pub fn linear_counting_threshold(&self) -> u32 {
        self.linear_counting_threshold
    }

    /// Maximum number of occupied registers kept in sparse representation.
    pub fn sparse_max_elements(&self) -> usize {
        self.sparse_max_elements
    }

    /// Expected relative standard error for large cardinalities.
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.m as f64).sqrt()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_valid_index_bits(DEFAULT_INDEX_BITS)
    }
}

/// Parameter for bias correction
#[inline]
pub(crate) fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

/// Each sparse entry costs about 15 bytes plus constant overhead, so sparse representation
/// only pays off while it holds fewer than `m / 15 - 10` registers.
#[inline]
pub(crate) fn sparse_max_elements(m: usize) -> usize {
    (m / 15).saturating_sub(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(4 => (60, 16, 0); "b4 starts dense")]
    #[test_case(7 => (57, 128, 0); "b7 starts dense")]
    #[test_case(8 => (56, 256, 7); "b8 first sparse")]
    #[test_case(14 => (50, 16384, 1082); "b14 default")]
    #[test_case(16 => (48, 65536, 4359); "b16 largest")]
    fn test_derived_constants(b: u8) -> (u8, usize, usize) {
        let config = Config::new(b).unwrap();
        (config.hash_bits(), config.m(), config.sparse_max_elements())
    }

    #[test_case(3; "below range")]
    #[test_case(17; "above range")]
    #[test_case(0; "zero")]
    fn test_unsupported_index_bits(b: u8) {
        assert_eq!(Config::new(b), Err(Error::UnsupportedAccuracy(b)));
    }

    #[test]
    fn test_alpha() {
        assert_eq!(alpha(16), 0.673);
        assert_eq!(alpha(32), 0.697);
        assert_eq!(alpha(64), 0.709);
        assert_eq!(alpha(16384), 0.7213 / (1.0 + 1.079 / 16384.0));
    }

    #[test]
    fn test_default_matches_new() {
        assert_eq!(Config::default(), Config::new(DEFAULT_INDEX_BITS).unwrap());
        assert_eq!(Config::default().linear_counting_threshold(), 11500);
    }

    #[test_case(4 => 10)]
    #[test_case(8 => 220)]
    #[test_case(12 => 3100)]
    #[test_case(14 => 11500)]
    #[test_case(16 => 50000)]
    fn test_linear_counting_threshold(b: u8) -> u32 {
        Config::new(b).unwrap().linear_counting_threshold()
    }

    #[test_case(0.26 => 4)]
    #[test_case(0.01625 => 12)]
    #[test_case(0.008125 => 14)]
    #[test_case(0.0040625 => 16)]
    #[test_case(0.9 => 4; "clamped to smallest")]
    #[test_case(0.0001 => 16; "clamped to largest")]
    fn test_with_standard_error(err: f64) -> u8 {
        Config::with_standard_error(err).unwrap().index_bits()
    }
}
