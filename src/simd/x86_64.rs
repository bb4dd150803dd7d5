//! SSSE3 backends.
//!
//! Both widths run in XMM registers. The narrow pipeline loads its 8-byte
//! tables with `movq`, so only the low eight lanes are meaningful; its folds
//! never move a lane from the upper half into lane 0.
//!
//! The public wrappers are only reachable through a `VectorClassifier` built
//! after `has_ssse3()` returned true.

use std::arch::x86_64::*;

use super::tables::{LaneTables, NARROW, SENTINEL, WIDE};
use super::{narrow_word, wide_word};
use crate::batch::{for_each_x1, for_each_x8};
use crate::core::cdf::{Category, Cdf, sample_level};

/// Constant registers loaded once per call.
struct Registers<const S: usize> {
    even_unpack: __m128i,
    odd_unpack: __m128i,
    bounds: __m128i,
    ordinals: __m128i,
    sentinel: __m128i,
    folds: [__m128i; S],
}

/// Load 8-byte tables into the low half of each register.
#[target_feature(enable = "ssse3")]
unsafe fn load_narrow(t: &LaneTables<8, 3>) -> Registers<3> {
    unsafe {
        let load = |table: &[u8; 8]| _mm_loadl_epi64(table.as_ptr() as *const __m128i);
        Registers {
            even_unpack: load(&t.even_unpack),
            odd_unpack: load(&t.odd_unpack),
            bounds: load(&t.bounds),
            ordinals: load(&t.ordinals),
            sentinel: _mm_set1_epi8(SENTINEL as i8),
            folds: [load(&t.folds[0]), load(&t.folds[1]), load(&t.folds[2])],
        }
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn load_wide(t: &LaneTables<16, 4>) -> Registers<4> {
    unsafe {
        let load = |table: &[u8; 16]| _mm_loadu_si128(table.as_ptr() as *const __m128i);
        Registers {
            even_unpack: load(&t.even_unpack),
            odd_unpack: load(&t.odd_unpack),
            bounds: load(&t.bounds),
            ordinals: load(&t.ordinals),
            sentinel: _mm_set1_epi8(SENTINEL as i8),
            folds: [
                load(&t.folds[0]),
                load(&t.folds[1]),
                load(&t.folds[2]),
                load(&t.folds[3]),
            ],
        }
    }
}

/// Unpack, compare, substitute ordinals, fold. Returns lane 0.
#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn reduce_lanes<const S: usize>(regs: &Registers<S>, sample: __m128i, word: u32) -> u8 {
    let even = _mm_cvtsi32_si128((word & 0x0F0F_0F0F) as i32);
    let odd = _mm_cvtsi32_si128(((word >> 4) & 0x0F0F_0F0F) as i32);
    let lanes = _mm_or_si128(
        _mm_or_si128(
            _mm_shuffle_epi8(even, regs.even_unpack),
            _mm_shuffle_epi8(odd, regs.odd_unpack),
        ),
        regs.bounds,
    );

    // Unsigned lanes >= sample exactly where max(lanes, sample) == lanes.
    let pass = _mm_cmpeq_epi8(_mm_max_epu8(lanes, sample), lanes);
    let mut reduce = _mm_or_si128(
        _mm_and_si128(pass, regs.ordinals),
        _mm_andnot_si128(pass, regs.sentinel),
    );

    for fold in &regs.folds {
        reduce = _mm_min_epu8(reduce, _mm_shuffle_epi8(reduce, *fold));
    }

    (_mm_cvtsi128_si32(reduce) & 0xFF) as u8
}

#[target_feature(enable = "ssse3")]
unsafe fn narrow_x1_impl(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_narrow(&NARROW);
        let sv = _mm_set1_epi8(s as i8);
        for_each_x1(cdf, out, |word| {
            narrow_word(s, word, |_, word| reduce_lanes(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn narrow_x8_impl(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_narrow(&NARROW);
        let sv = _mm_set1_epi8(s as i8);
        for_each_x8(cdf, out, |word| {
            narrow_word(s, word, |_, word| reduce_lanes(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn wide_x1_impl(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_wide(&WIDE);
        let sv = _mm_set1_epi8(s as i8);
        for_each_x1(cdf, out, |word| {
            wide_word(s, word, |_, word| reduce_lanes(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn wide_x8_impl(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_wide(&WIDE);
        let sv = _mm_set1_epi8(s as i8);
        for_each_x8(cdf, out, |word| {
            wide_word(s, word, |_, word| reduce_lanes(&regs, sv, word))
        });
    }
}

pub(super) fn narrow_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    // SAFETY: only installed after SSSE3 was detected
    unsafe { narrow_x1_impl(sample, cdf, out) }
}

pub(super) fn narrow_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    // SAFETY: only installed after SSSE3 was detected
    unsafe { narrow_x8_impl(sample, cdf, out) }
}

pub(super) fn wide_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    // SAFETY: only installed after SSSE3 was detected
    unsafe { wide_x1_impl(sample, cdf, out) }
}

pub(super) fn wide_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    // SAFETY: only installed after SSSE3 was detected
    unsafe { wide_x8_impl(sample, cdf, out) }
}
