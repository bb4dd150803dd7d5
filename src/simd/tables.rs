//! Lane tables for the vector pipeline, generated from the nibble-order
//! contract: register lane `i` holds boundary `c[i]`.
//!
//! A CDF word is split into an even-boundary word (`word & 0x0F0F0F0F`, byte
//! `k` = `c[2k]`) and an odd-boundary word (`(word >> 4) & 0x0F0F0F0F`, byte
//! `k` = `c[2k+1]`). Each is placed in the low four bytes of a register and
//! shuffled into position. Shuffle indices follow `pshufb`/`tbl` rules: an
//! index outside the register (we use [`ZERO_LANE`]) produces zero.
//!
//! Only register width and the injected final boundary differ between the
//! narrow and wide tables; the pipeline that consumes them is the same.

use crate::core::cdf::{BOUNDARIES, MAX_LEVEL};

/// Shuffle index that yields a zero lane on every backend.
pub const ZERO_LANE: u8 = 0x80;

/// Reduction value for lanes whose boundary is below the sample.
pub const SENTINEL: u8 = 0xFF;

/// Constant registers for one register width.
///
/// `W` is the lane count and `S = log2(W)` the number of reduction folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneTables<const W: usize, const S: usize> {
    /// Moves even boundaries from bytes `0..4` to lanes `0, 2, 4, 6`.
    pub even_unpack: [u8; W],
    /// Moves odd boundaries from bytes `0..4` to lanes `1, 3, 5, 7`.
    pub odd_unpack: [u8; W],
    /// OR-ed into the unpacked lanes; carries the implicit `c[8] = 15` when
    /// the register has room for it.
    pub bounds: [u8; W],
    /// Category reported by each lane when its boundary passes.
    pub ordinals: [u8; W],
    /// Pairwise-min folds; fold `k` brings lane `j + W/2^(k+1)` down to `j`.
    pub folds: [[u8; W]; S],
}

impl<const W: usize, const S: usize> LaneTables<W, S> {
    /// Lanes that carry a boundary (stored or injected).
    pub const fn boundary_lanes(&self) -> usize {
        let mut n = 0;
        while n < W && self.ordinals[n] != SENTINEL {
            n += 1;
        }
        n
    }
}

const fn generate<const W: usize, const S: usize>(inject_final: bool) -> LaneTables<W, S> {
    assert!(W >= BOUNDARIES, "register too narrow for eight boundaries");
    assert!(W >> S == 1, "fold count must be log2 of lane count");
    assert!(!inject_final || W > BOUNDARIES, "no spare lane for the final boundary");

    let mut even_unpack = [ZERO_LANE; W];
    let mut odd_unpack = [ZERO_LANE; W];
    let mut i = 0;
    while i < BOUNDARIES {
        if i % 2 == 0 {
            even_unpack[i] = (i / 2) as u8;
        } else {
            odd_unpack[i] = (i / 2) as u8;
        }
        i += 1;
    }

    let mut bounds = [0u8; W];
    let live = if inject_final {
        bounds[BOUNDARIES] = MAX_LEVEL;
        BOUNDARIES + 1
    } else {
        BOUNDARIES
    };

    let mut ordinals = [SENTINEL; W];
    let mut i = 0;
    while i < live {
        ordinals[i] = (i + 1) as u8;
        i += 1;
    }

    let mut folds = [[ZERO_LANE; W]; S];
    let mut k = 0;
    while k < S {
        let half = W >> (k + 1);
        let mut j = 0;
        while j < half {
            folds[k][j] = (j + half) as u8;
            j += 1;
        }
        k += 1;
    }

    LaneTables {
        even_unpack,
        odd_unpack,
        bounds,
        ordinals,
        folds,
    }
}

/// 8-byte register: boundaries only; overflow is decided before the pipeline.
pub const NARROW: LaneTables<8, 3> = generate(false);

/// 16-byte register: boundaries plus `c[8] = 15` in lane 8.
pub const WIDE: LaneTables<16, 4> = generate(true);
