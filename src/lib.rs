//! Classify quantized samples against nibble-packed cumulative distributions.
//!
//! A [`Cdf`] word holds eight non-decreasing 4-bit boundaries. A sample of
//! zero always lands in category 0; any other sample lands in the first
//! category `i + 1` whose boundary `c[i]` is at least the sample, or in
//! category 9 when it exceeds every boundary.
//!
//! Two implementations are provided and kept equivalent:
//!
//! - [`scalar`]: a branch cascade over the nibbles
//! - [`VectorClassifier`]: a byte-lane shuffle/compare/min pipeline with
//!   narrow (8-lane) and wide (16-lane) variants, on SSSE3, NEON or a
//!   portable emulation
//!
//! # Example
//!
//! ```
//! use nibble_cdf::{Cdf, VectorClassifier, classify};
//!
//! let cdf: Cdf = "0x76543210".parse().unwrap();
//! assert_eq!(classify(4, cdf), 5);
//! assert_eq!(VectorClassifier::detect().classify_one(4, cdf), 5);
//! ```

mod batch;
pub mod bench;
pub mod buffer;
pub mod core;
pub mod scalar;
pub mod simd;
pub mod validate;

pub use bench::{BenchError, BenchReport, Variant, run_benchmark};
pub use buffer::AlignedBuf;
pub use crate::core::cdf::{
    CATEGORY_OVERFLOW, CATEGORY_ZERO, Category, Cdf, ParseCdfError, classify, pack_categories,
    unpack_categories,
};
pub use crate::core::config::{BenchConfig, Config, ConfigError, WidthPreference};
pub use simd::{Backend, RegisterWidth, VectorClassifier};
pub use validate::{
    EquivalenceError, agree_on_word, validate_all_backends, validate_classifiers,
    validate_equivalence,
};

#[cfg(test)]
mod tests;
