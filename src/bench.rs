//! Throughput comparison of the four classification entry points.
//!
//! - Scalar unbatched: cascade, one category per word
//! - Scalar batched: cascade, eight categories packed per group
//! - Vector unbatched: register pipeline, one category per word
//! - Vector batched: register pipeline, eight categories packed per group
//!
//! A run re-checks that all four agree on the generated batch before timing
//! anything, and refuses to report numbers if they do not.
//!
//! # Example
//!
//! ```no_run
//! use nibble_cdf::bench::run_benchmark;
//! use nibble_cdf::{BenchConfig, VectorClassifier};
//!
//! let report = run_benchmark(&BenchConfig::default(), &VectorClassifier::detect()).unwrap();
//! println!("{report}");
//! ```

use std::fmt;
use std::hint::black_box;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::buffer::AlignedBuf;
use crate::core::cdf::{BOUNDARIES, Category, Cdf, GROUP, MAX_LEVEL, pack_categories};
use crate::core::config::{BenchConfig, ConfigError};
use crate::scalar;
use crate::simd::{VectorClassifier, has_neon, has_ssse3};
use crate::validate::{EquivalenceError, compare_batched, compare_single};

/// Timed entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    ScalarX1,
    ScalarX8,
    VectorX1,
    VectorX8,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::ScalarX1,
        Variant::ScalarX8,
        Variant::VectorX1,
        Variant::VectorX8,
    ];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::ScalarX1 => write!(f, "scalar unbatched"),
            Variant::ScalarX8 => write!(f, "scalar batched"),
            Variant::VectorX1 => write!(f, "vectorized unbatched"),
            Variant::VectorX8 => write!(f, "vectorized batched"),
        }
    }
}

/// Platform capabilities for SIMD.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub arch: &'static str,
    pub simd_features: Vec<&'static str>,
}

impl PlatformInfo {
    /// Detect current platform capabilities.
    pub fn detect() -> Self {
        let mut simd_features = Vec::new();
        if has_ssse3() {
            simd_features.push("SSSE3");
        }
        if has_neon() {
            simd_features.push("NEON");
        }

        PlatformInfo {
            arch: std::env::consts::ARCH,
            simd_features,
        }
    }

    /// Format as display string.
    pub fn display(&self) -> String {
        if self.simd_features.is_empty() {
            self.arch.to_string()
        } else {
            format!("{} ({})", self.arch, self.simd_features.join(", "))
        }
    }
}

/// Errors that stop a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("classifiers disagree on generated batch: {0}")]
    Equivalence(#[from] EquivalenceError),
}

/// Measurement for one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantResult {
    pub variant: Variant,
    pub elapsed: Duration,
    pub classifications_per_sec: f64,
}

/// Outcome of [`run_benchmark`].
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub platform: PlatformInfo,
    pub classifier: VectorClassifier,
    pub batch_len: usize,
    pub iterations: u64,
    pub sample: u8,
    pub results: Vec<VariantResult>,
    pub best: Variant,
}

impl BenchReport {
    pub fn result(&self, variant: Variant) -> Option<&VariantResult> {
        self.results.iter().find(|r| r.variant == variant)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "benchmarking on {} with {} vector classifier",
            self.platform.display(),
            self.classifier
        )?;
        writeln!(
            f,
            "{} words x {} iterations, sample {}",
            self.batch_len, self.iterations, self.sample
        )?;
        for (i, r) in self.results.iter().enumerate() {
            writeln!(
                f,
                "{}. {:<22} {:>14.0} classifications/s",
                i + 1,
                r.variant.to_string(),
                r.classifications_per_sec
            )?;
        }
        write!(f, "best is {}", self.best)
    }
}

/// Seeded RNG for reproducible batches, or OS-seeded when `seed` is `None`.
pub fn batch_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Generate `len` CDF words by a random walk: each word starts at 0-2 and
/// climbs 0-2 per boundary, saturating at 15 so every word is well-formed.
pub fn generate_batch<R: Rng + ?Sized>(rng: &mut R, len: usize) -> AlignedBuf<Cdf> {
    let mut batch = AlignedBuf::zeroed(len);
    for word in batch.iter_mut() {
        let mut boundaries = [0u8; BOUNDARIES];
        let mut level: u8 = rng.random_range(0..3);
        for boundary in boundaries.iter_mut() {
            *boundary = level.min(MAX_LEVEL);
            level = level.saturating_add(rng.random_range(0..3));
        }
        *word = Cdf::pack(boundaries);
    }
    batch
}

/// Check that all four entry points agree on `batch`.
///
/// # Panics
///
/// Panics if `batch.len()` is not a multiple of 8.
pub fn verify_batch(
    sample: u8,
    batch: &[Cdf],
    vector: &VectorClassifier,
) -> Result<(), EquivalenceError> {
    let mut scalar_x1 = AlignedBuf::<Category>::zeroed(batch.len());
    let mut vector_x1 = AlignedBuf::<Category>::zeroed(batch.len());
    scalar::classify_x1(sample, batch, &mut scalar_x1);
    vector.classify_x1(sample, batch, &mut vector_x1);
    compare_single("unbatched", vector, sample, batch, &scalar_x1, &vector_x1)?;

    let groups = batch.len() / GROUP;
    let mut scalar_x8 = AlignedBuf::<u32>::zeroed(groups);
    let mut vector_x8 = AlignedBuf::<u32>::zeroed(groups);
    scalar::classify_x8(sample, batch, &mut scalar_x8);
    vector.classify_x8(sample, batch, &mut vector_x8);
    compare_batched("batched", vector, sample, &scalar_x8, &vector_x8)?;

    let regrouped: Vec<u32> = vector_x1
        .chunks_exact(GROUP)
        .map(|group| {
            let mut categories = [0; GROUP];
            categories.copy_from_slice(group);
            pack_categories(categories)
        })
        .collect();
    compare_batched("batched vs unbatched", vector, sample, &regrouped, &vector_x8)?;

    debug!(words = batch.len(), sample, "batch verified");
    Ok(())
}

fn time_iterations<F: FnMut()>(iterations: u64, mut run: F) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        run();
    }
    start.elapsed()
}

/// Generate a batch, verify it, then time every variant.
pub fn run_benchmark(
    config: &BenchConfig,
    vector: &VectorClassifier,
) -> Result<BenchReport, BenchError> {
    config.validate()?;

    let mut rng = batch_rng(config.seed);
    let batch = generate_batch(&mut rng, config.batch_len);
    let sample = config.sample;

    verify_batch(sample, &batch, vector)?;

    let mut categories = AlignedBuf::<Category>::zeroed(batch.len());
    let mut packed = AlignedBuf::<u32>::zeroed(batch.len() / GROUP);
    let classified = (config.batch_len as f64) * (config.iterations as f64);

    info!(
        classifier = %vector,
        words = config.batch_len,
        iterations = config.iterations,
        "benchmarking"
    );

    let mut results = Vec::with_capacity(Variant::ALL.len());
    for variant in Variant::ALL {
        let elapsed = match variant {
            Variant::ScalarX1 => time_iterations(config.iterations, || {
                scalar::classify_x1(black_box(sample), black_box(&batch), &mut categories);
                black_box(&mut categories);
            }),
            Variant::ScalarX8 => time_iterations(config.iterations, || {
                scalar::classify_x8(black_box(sample), black_box(&batch), &mut packed);
                black_box(&mut packed);
            }),
            Variant::VectorX1 => time_iterations(config.iterations, || {
                vector.classify_x1(black_box(sample), black_box(&batch), &mut categories);
                black_box(&mut categories);
            }),
            Variant::VectorX8 => time_iterations(config.iterations, || {
                vector.classify_x8(black_box(sample), black_box(&batch), &mut packed);
                black_box(&mut packed);
            }),
        };

        let secs = elapsed.as_secs_f64().max(f64::MIN_POSITIVE);
        let result = VariantResult {
            variant,
            elapsed,
            classifications_per_sec: classified / secs,
        };
        info!(
            variant = %variant,
            per_sec = result.classifications_per_sec,
            elapsed_ms = elapsed.as_millis() as u64,
            "variant timed"
        );
        results.push(result);
    }

    let best = results
        .iter()
        .fold(None::<&VariantResult>, |best, r| match best {
            Some(b) if b.classifications_per_sec >= r.classifications_per_sec => Some(b),
            _ => Some(r),
        })
        .map_or(Variant::ScalarX1, |r| r.variant);

    Ok(BenchReport {
        platform: PlatformInfo::detect(),
        classifier: *vector,
        batch_len: config.batch_len,
        iterations: config.iterations,
        sample,
        results,
        best,
    })
}
