//! Portable emulation of the register pipeline over byte arrays.
//!
//! Runs the same unpack, compare, ordinal and fold steps as the native
//! backends, driven by the same [`LaneTables`], with `[u8; W]` standing in
//! for a register. It is available on every target and serves as the fallback
//! when no native backend is.

use super::tables::{LaneTables, NARROW, SENTINEL, WIDE};
use super::{narrow_word, wide_word};
use crate::batch::{for_each_x1, for_each_x8};
use crate::core::cdf::{Category, Cdf, sample_level};

/// Byte shuffle with `tbl` semantics: out-of-range indices give zero.
#[inline(always)]
fn shuffle<const W: usize>(register: &[u8; W], indices: &[u8; W]) -> [u8; W] {
    std::array::from_fn(|lane| {
        let idx = indices[lane] as usize;
        if idx < W { register[idx] } else { 0 }
    })
}

/// Place a 32-bit word in the low four lanes of a zeroed register.
#[inline(always)]
fn load_word<const W: usize>(word: u32) -> [u8; W] {
    let bytes = word.to_le_bytes();
    std::array::from_fn(|lane| if lane < bytes.len() { bytes[lane] } else { 0 })
}

/// Smallest passing ordinal, or [`SENTINEL`] when no lane passes.
#[inline(always)]
pub(crate) fn reduce_lanes<const W: usize, const S: usize>(
    tables: &LaneTables<W, S>,
    s: u8,
    word: u32,
) -> u8 {
    let even = shuffle(&load_word::<W>(word & 0x0F0F_0F0F), &tables.even_unpack);
    let odd = shuffle(&load_word::<W>((word >> 4) & 0x0F0F_0F0F), &tables.odd_unpack);

    let mut reduce: [u8; W] = std::array::from_fn(|lane| {
        let boundary = even[lane] | odd[lane] | tables.bounds[lane];
        if boundary >= s {
            tables.ordinals[lane]
        } else {
            SENTINEL
        }
    });

    for fold in &tables.folds {
        let shifted = shuffle(&reduce, fold);
        for (lane, value) in reduce.iter_mut().enumerate() {
            *value = (*value).min(shifted[lane]);
        }
    }

    reduce[0]
}

pub(crate) fn narrow_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    let s = sample_level(sample);
    for_each_x1(cdf, out, |word| {
        narrow_word(s, word, |s, word| reduce_lanes(&NARROW, s, word))
    });
}

pub(crate) fn narrow_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    let s = sample_level(sample);
    for_each_x8(cdf, out, |word| {
        narrow_word(s, word, |s, word| reduce_lanes(&NARROW, s, word))
    });
}

pub(crate) fn wide_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    let s = sample_level(sample);
    for_each_x1(cdf, out, |word| {
        wide_word(s, word, |s, word| reduce_lanes(&WIDE, s, word))
    });
}

pub(crate) fn wide_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    let s = sample_level(sample);
    for_each_x8(cdf, out, |word| {
        wide_word(s, word, |s, word| reduce_lanes(&WIDE, s, word))
    });
}
