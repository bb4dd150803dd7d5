//! Nibble-packed CDF format and the classification rule.
//!
//! A [`Cdf`] packs eight cumulative boundaries `c[0..7]`, one 4-bit magnitude
//! per nibble, with boundary `i` at bits `4i..4i+3`. Two boundaries are
//! implicit and never stored: `c[-1] = 0` and `c[8] = 15`. Together they
//! delimit nine categories (0-8) plus the overflow category 9.
//!
//! The rule, for a sample `s` (low nibble only):
//!
//! 1. `s == 0` gives category 0, regardless of the boundaries.
//! 2. Otherwise the category is `i + 1` for the smallest `i` with `c[i] >= s`.
//! 3. If no boundary qualifies, the category is 9.
//!
//! Every classifier in this crate must reproduce [`classify`] bit for bit.

use std::fmt;
use std::str::FromStr;

/// Category index in `0..=9`.
pub type Category = u8;

/// Number of stored boundaries per CDF word.
pub const BOUNDARIES: usize = 8;

/// Number of CDF words classified together by the batched entry points.
pub const GROUP: usize = 8;

/// Largest boundary/sample magnitude.
pub const MAX_LEVEL: u8 = 0x0F;

/// Category returned for a zero sample.
pub const CATEGORY_ZERO: Category = 0;

/// Category returned when the sample exceeds every stored boundary.
pub const CATEGORY_OVERFLOW: Category = 9;

/// Bit position of boundary `i` inside a CDF word.
#[inline(always)]
pub const fn nibble_shift(i: usize) -> u32 {
    (i as u32) * 4
}

/// Reduce a sample byte to its magnitude. The upper four bits are ignored.
#[inline(always)]
pub const fn sample_level(sample: u8) -> u8 {
    sample & MAX_LEVEL
}

/// A cumulative distribution packed into one 32-bit word.
///
/// Well-formedness (`c[0] <= c[1] <= ... <= c[7]`) is a caller precondition;
/// nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Cdf(u32);

impl Cdf {
    /// Wrap a raw packed word.
    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Cdf(bits)
    }

    /// Raw packed word.
    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Pack eight boundaries; each value is truncated to its low nibble.
    pub const fn pack(boundaries: [u8; BOUNDARIES]) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < BOUNDARIES {
            bits |= ((boundaries[i] & MAX_LEVEL) as u32) << nibble_shift(i);
            i += 1;
        }
        Cdf(bits)
    }

    /// Unpack all eight boundaries in position order.
    pub const fn unpack(self) -> [u8; BOUNDARIES] {
        let mut out = [0u8; BOUNDARIES];
        let mut i = 0;
        while i < BOUNDARIES {
            out[i] = self.boundary(i);
            i += 1;
        }
        out
    }

    /// Boundary `c[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 8`.
    #[inline(always)]
    pub const fn boundary(self, i: usize) -> u8 {
        assert!(i < BOUNDARIES, "boundary index out of range");
        ((self.0 >> nibble_shift(i)) & MAX_LEVEL as u32) as u8
    }

    /// Top stored boundary `c[7]`.
    #[inline(always)]
    pub const fn top(self) -> u8 {
        (self.0 >> nibble_shift(BOUNDARIES - 1)) as u8
    }

    /// Whether the boundaries are non-decreasing.
    ///
    /// Classifiers never call this; it exists for diagnostics and tests.
    pub fn is_well_formed(self) -> bool {
        let b = self.unpack();
        b.windows(2).all(|w| w[0] <= w[1])
    }
}

impl From<u32> for Cdf {
    fn from(bits: u32) -> Self {
        Cdf(bits)
    }
}

impl From<Cdf> for u32 {
    fn from(cdf: Cdf) -> Self {
        cdf.0
    }
}

impl fmt::Display for Cdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::LowerHex for Cdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Error parsing a CDF word from hex text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CDF word '{input}': expected up to 8 hex digits, optionally prefixed with 0x")]
pub struct ParseCdfError {
    input: String,
}

impl FromStr for Cdf {
    type Err = ParseCdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 8 {
            return Err(ParseCdfError {
                input: s.to_string(),
            });
        }

        u32::from_str_radix(digits, 16)
            .map(Cdf)
            .map_err(|_| ParseCdfError {
                input: s.to_string(),
            })
    }
}

/// Classify `sample` against `cdf`. This is the definition every
/// classifier is checked against.
pub fn classify(sample: u8, cdf: Cdf) -> Category {
    let s = sample_level(sample);
    if s == 0 {
        return CATEGORY_ZERO;
    }
    cdf.unpack()
        .iter()
        .position(|&c| c >= s)
        .map_or(CATEGORY_OVERFLOW, |i| i as Category + 1)
}

/// Pack a group's eight categories into one word, category `j` at nibble `j`.
pub const fn pack_categories(categories: [Category; GROUP]) -> u32 {
    let mut word = 0u32;
    let mut j = 0;
    while j < GROUP {
        word |= ((categories[j] & MAX_LEVEL) as u32) << nibble_shift(j);
        j += 1;
    }
    word
}

/// Inverse of [`pack_categories`].
pub const fn unpack_categories(word: u32) -> [Category; GROUP] {
    let mut out = [0u8; GROUP];
    let mut j = 0;
    while j < GROUP {
        out[j] = ((word >> nibble_shift(j)) & MAX_LEVEL as u32) as u8;
        j += 1;
    }
    out
}
