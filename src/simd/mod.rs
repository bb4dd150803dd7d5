//! Register-parallel classifier.
//!
//! Every backend runs the same pipeline per CDF word:
//!
//! 1. unpack the eight nibbles into byte lanes (lane `i` = `c[i]`)
//! 2. broadcast the sample and test `c[i] >= sample` per lane
//! 3. replace passing lanes with their ordinal, failing lanes with 255
//! 4. fold halves with byte-min until lane 0 holds the answer
//!
//! The narrow (8-byte) pipeline has no room for the implicit final boundary,
//! so it answers the overflow category with a scalar test on `c[7]` before
//! touching a register. The wide (16-byte) pipeline injects `c[8] = 15` as a
//! ninth lane and needs one extra fold. Both answer a zero sample up front.
//!
//! Backends are chosen once, from runtime CPU feature detection, and cached.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

use crate::core::cdf::{CATEGORY_OVERFLOW, CATEGORY_ZERO, Category, Cdf};
use crate::core::config::WidthPreference;

pub mod tables;

mod portable;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod x86_64;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
mod aarch64;

// CPU feature detection cache
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
static HAS_SSSE3: OnceLock<bool> = OnceLock::new();

static DETECTED: OnceLock<VectorClassifier> = OnceLock::new();

/// Check if SSSE3 is available (cached after first call)
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub fn has_ssse3() -> bool {
    *HAS_SSSE3.get_or_init(|| is_x86_feature_detected!("ssse3"))
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
pub fn has_ssse3() -> bool {
    false
}

/// Check if NEON is available (aarch64 only)
#[cfg(all(feature = "simd", target_arch = "aarch64"))]
pub fn has_neon() -> bool {
    true // NEON is mandatory on aarch64
}

#[cfg(not(all(feature = "simd", target_arch = "aarch64")))]
pub fn has_neon() -> bool {
    false
}

/// Zero-sample and overflow pre-checks around the narrow pipeline.
#[inline(always)]
pub(crate) fn narrow_word<F>(s: u8, word: u32, pipeline: F) -> Category
where
    F: FnOnce(u8, u32) -> u8,
{
    if s == 0 {
        CATEGORY_ZERO
    } else if word >> 28 < u32::from(s) {
        CATEGORY_OVERFLOW
    } else {
        pipeline(s, word)
    }
}

/// Zero-sample pre-check around the wide pipeline.
#[inline(always)]
pub(crate) fn wide_word<F>(s: u8, word: u32, pipeline: F) -> Category
where
    F: FnOnce(u8, u32) -> u8,
{
    if s == 0 {
        CATEGORY_ZERO
    } else {
        pipeline(s, word)
    }
}

/// Vector register width of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWidth {
    /// 8 byte lanes; overflow via scalar pre-check.
    Narrow,
    /// 16 byte lanes; overflow lane injected into the register.
    Wide,
}

impl RegisterWidth {
    pub const ALL: [RegisterWidth; 2] = [RegisterWidth::Narrow, RegisterWidth::Wide];

    /// Register size in bytes.
    pub const fn lanes(self) -> usize {
        match self {
            RegisterWidth::Narrow => 8,
            RegisterWidth::Wide => 16,
        }
    }
}

impl fmt::Display for RegisterWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterWidth::Narrow => write!(f, "narrow"),
            RegisterWidth::Wide => write!(f, "wide"),
        }
    }
}

/// Instruction set a classifier runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Array emulation; always available
    Portable,
    /// x86_64 `pshufb`/`pminub`
    Ssse3,
    /// aarch64 `tbl`/`umin`
    Neon,
}

impl Backend {
    /// Whether this backend can run on the current CPU.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Portable => true,
            Backend::Ssse3 => has_ssse3(),
            Backend::Neon => has_neon(),
        }
    }

    /// Native backend for this target, if any.
    pub fn native() -> Option<Backend> {
        [Backend::Ssse3, Backend::Neon]
            .into_iter()
            .find(|b| b.is_available())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Portable => write!(f, "portable"),
            Backend::Ssse3 => write!(f, "SSSE3"),
            Backend::Neon => write!(f, "NEON"),
        }
    }
}

pub(crate) type X1Fn = fn(u8, &[Cdf], &mut [Category]);
pub(crate) type X8Fn = fn(u8, &[Cdf], &mut [u32]);

/// A vector classification strategy: one register width on one backend.
///
/// Entry points have the same contract as [`crate::scalar`]: the sample's
/// upper four bits are ignored, `classify_x1` writes one category per word,
/// and `classify_x8` packs each group of eight into `out[group]`.
#[derive(Clone, Copy)]
pub struct VectorClassifier {
    pub(crate) width: RegisterWidth,
    pub(crate) backend: Backend,
    pub(crate) x1: X1Fn,
    pub(crate) x8: X8Fn,
}

impl fmt::Debug for VectorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorClassifier")
            .field("width", &self.width)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl PartialEq for VectorClassifier {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.backend == other.backend
    }
}

impl Eq for VectorClassifier {}

impl VectorClassifier {
    /// Best classifier for this CPU (cached after first call).
    ///
    /// A native backend gets the wide pipeline; without one the portable wide
    /// pipeline is used.
    pub fn detect() -> Self {
        *DETECTED.get_or_init(|| {
            let classifier = Self::for_width(RegisterWidth::Wide);
            debug!(
                width = %classifier.width,
                backend = %classifier.backend,
                "selected vector classifier"
            );
            classifier
        })
    }

    /// Classifier honouring a configured width preference.
    pub fn for_preference(preference: WidthPreference) -> Self {
        match preference {
            WidthPreference::Auto => Self::detect(),
            WidthPreference::Narrow => Self::for_width(RegisterWidth::Narrow),
            WidthPreference::Wide => Self::for_width(RegisterWidth::Wide),
        }
    }

    /// Fastest available backend for `width`.
    pub fn for_width(width: RegisterWidth) -> Self {
        Backend::native()
            .and_then(|backend| Self::with_backend(width, backend))
            .unwrap_or_else(|| Self::portable(width))
    }

    /// Portable emulation of `width`.
    pub fn portable(width: RegisterWidth) -> Self {
        match width {
            RegisterWidth::Narrow => VectorClassifier {
                width,
                backend: Backend::Portable,
                x1: portable::narrow_x1,
                x8: portable::narrow_x8,
            },
            RegisterWidth::Wide => VectorClassifier {
                width,
                backend: Backend::Portable,
                x1: portable::wide_x1,
                x8: portable::wide_x8,
            },
        }
    }

    /// Classifier for an explicit backend, or `None` if this CPU lacks it.
    pub fn with_backend(width: RegisterWidth, backend: Backend) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }

        match backend {
            Backend::Portable => Some(Self::portable(width)),
            Backend::Ssse3 => Self::ssse3(width),
            Backend::Neon => Self::neon(width),
        }
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    fn ssse3(width: RegisterWidth) -> Option<Self> {
        let (x1, x8): (X1Fn, X8Fn) = match width {
            RegisterWidth::Narrow => (x86_64::narrow_x1, x86_64::narrow_x8),
            RegisterWidth::Wide => (x86_64::wide_x1, x86_64::wide_x8),
        };
        Some(VectorClassifier {
            width,
            backend: Backend::Ssse3,
            x1,
            x8,
        })
    }

    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    fn ssse3(_width: RegisterWidth) -> Option<Self> {
        None
    }

    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    fn neon(width: RegisterWidth) -> Option<Self> {
        let (x1, x8): (X1Fn, X8Fn) = match width {
            RegisterWidth::Narrow => (aarch64::narrow_x1, aarch64::narrow_x8),
            RegisterWidth::Wide => (aarch64::wide_x1, aarch64::wide_x8),
        };
        Some(VectorClassifier {
            width,
            backend: Backend::Neon,
            x1,
            x8,
        })
    }

    #[cfg(not(all(feature = "simd", target_arch = "aarch64")))]
    fn neon(_width: RegisterWidth) -> Option<Self> {
        None
    }

    /// Every classifier this CPU can run: each width on the portable backend
    /// and, when present, on the native one.
    pub fn available() -> Vec<Self> {
        let mut all = Vec::new();
        for width in RegisterWidth::ALL {
            all.push(Self::portable(width));
            if let Some(classifier) =
                Backend::native().and_then(|backend| Self::with_backend(width, backend))
            {
                all.push(classifier);
            }
        }
        all
    }

    pub fn width(&self) -> RegisterWidth {
        self.width
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Classify one word.
    pub fn classify_one(&self, sample: u8, cdf: Cdf) -> Category {
        let mut out = [0; 1];
        (self.x1)(sample, std::slice::from_ref(&cdf), &mut out);
        out[0]
    }

    /// Classify every word of `cdf` into the matching slot of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != cdf.len()`.
    pub fn classify_x1(&self, sample: u8, cdf: &[Cdf], out: &mut [Category]) {
        (self.x1)(sample, cdf, out)
    }

    /// Classify in groups of eight; group `g` is packed into `out[g]`.
    ///
    /// # Panics
    ///
    /// Panics if `cdf.len()` is not a multiple of 8 or `out.len() != cdf.len() / 8`.
    pub fn classify_x8(&self, sample: u8, cdf: &[Cdf], out: &mut [u32]) {
        (self.x8)(sample, cdf, out)
    }
}

impl fmt::Display for VectorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.width, self.backend)
    }
}
