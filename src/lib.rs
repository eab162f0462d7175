//! `hll-cardinality` is a Rust crate designed to estimate the number of distinct elements in a
//! stream or dataset in an efficient manner.
//!
//! This library uses HyperLogLog with empirical bias correction, linear counting for small ranges,
//! exact counting of up to 100 distinct elements and a sparse register representation for low
//! memory footprint.
//!
//! ```
//! use hll_cardinality::Estimator;
//!
//! let mut lhs = Estimator::<wyhash::WyHash>::new(14)?;
//! let mut rhs = Estimator::<wyhash::WyHash>::new(14)?;
//! for i in 0..60 {
//!     lhs.insert(&i);
//!     rhs.insert(&(i + 30));
//! }
//! lhs.merge(&rhs)?;
//! assert_eq!(lhs.estimate(), 90);
//! # Ok::<(), hll_cardinality::Error>(())
//! ```
pub mod bias;
mod bias_data;
pub mod config;
mod dense;
mod direct;
pub mod error;
pub mod estimator;
pub mod hash;
pub mod representation;
#[cfg(feature = "with_serde")]
mod serde;
pub mod snapshot;
mod sparse;

pub use bias::{correct_bias, BiasTable};
pub use config::Config;
pub use direct::DIRECT_COUNTER_MAX_ELEMENTS;
pub use error::{Error, Result};
pub use estimator::Estimator;
pub use hash::{index, rank};
pub use representation::Representation;
pub use snapshot::Snapshot;
