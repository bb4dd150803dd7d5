//! NEON backends.
//!
//! aarch64 has native 8-byte vectors, so the narrow pipeline runs on
//! `uint8x8_t` with `tbl` and `umin`, and the wide pipeline on `uint8x16_t`.
//! Out-of-range `tbl` indices read as zero, matching the shared tables.

use std::arch::aarch64::*;

use super::tables::{NARROW, SENTINEL, WIDE};
use super::{narrow_word, wide_word};
use crate::batch::{for_each_x1, for_each_x8};
use crate::core::cdf::{Category, Cdf, sample_level};

struct NarrowRegisters {
    even_unpack: uint8x8_t,
    odd_unpack: uint8x8_t,
    bounds: uint8x8_t,
    ordinals: uint8x8_t,
    sentinel: uint8x8_t,
    folds: [uint8x8_t; 3],
}

struct WideRegisters {
    even_unpack: uint8x16_t,
    odd_unpack: uint8x16_t,
    bounds: uint8x16_t,
    ordinals: uint8x16_t,
    sentinel: uint8x16_t,
    folds: [uint8x16_t; 4],
}

#[target_feature(enable = "neon")]
unsafe fn load_narrow() -> NarrowRegisters {
    unsafe {
        let t = &NARROW;
        NarrowRegisters {
            even_unpack: vld1_u8(t.even_unpack.as_ptr()),
            odd_unpack: vld1_u8(t.odd_unpack.as_ptr()),
            bounds: vld1_u8(t.bounds.as_ptr()),
            ordinals: vld1_u8(t.ordinals.as_ptr()),
            sentinel: vdup_n_u8(SENTINEL),
            folds: [
                vld1_u8(t.folds[0].as_ptr()),
                vld1_u8(t.folds[1].as_ptr()),
                vld1_u8(t.folds[2].as_ptr()),
            ],
        }
    }
}

#[target_feature(enable = "neon")]
unsafe fn load_wide() -> WideRegisters {
    unsafe {
        let t = &WIDE;
        WideRegisters {
            even_unpack: vld1q_u8(t.even_unpack.as_ptr()),
            odd_unpack: vld1q_u8(t.odd_unpack.as_ptr()),
            bounds: vld1q_u8(t.bounds.as_ptr()),
            ordinals: vld1q_u8(t.ordinals.as_ptr()),
            sentinel: vdupq_n_u8(SENTINEL),
            folds: [
                vld1q_u8(t.folds[0].as_ptr()),
                vld1q_u8(t.folds[1].as_ptr()),
                vld1q_u8(t.folds[2].as_ptr()),
                vld1q_u8(t.folds[3].as_ptr()),
            ],
        }
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn reduce_narrow(regs: &NarrowRegisters, sample: uint8x8_t, word: u32) -> u8 {
    unsafe {
        let even = vcreate_u8(u64::from(word & 0x0F0F_0F0F));
        let odd = vcreate_u8(u64::from((word >> 4) & 0x0F0F_0F0F));
        let lanes = vorr_u8(
            vorr_u8(
                vtbl1_u8(even, regs.even_unpack),
                vtbl1_u8(odd, regs.odd_unpack),
            ),
            regs.bounds,
        );

        let pass = vcge_u8(lanes, sample);
        let mut reduce = vbsl_u8(pass, regs.ordinals, regs.sentinel);

        for fold in &regs.folds {
            reduce = vmin_u8(reduce, vtbl1_u8(reduce, *fold));
        }

        vget_lane_u8::<0>(reduce)
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn reduce_wide(regs: &WideRegisters, sample: uint8x16_t, word: u32) -> u8 {
    unsafe {
        let even = vreinterpretq_u8_u32(vdupq_n_u32(word & 0x0F0F_0F0F));
        let odd = vreinterpretq_u8_u32(vdupq_n_u32((word >> 4) & 0x0F0F_0F0F));
        let lanes = vorrq_u8(
            vorrq_u8(
                vqtbl1q_u8(even, regs.even_unpack),
                vqtbl1q_u8(odd, regs.odd_unpack),
            ),
            regs.bounds,
        );

        let pass = vcgeq_u8(lanes, sample);
        let mut reduce = vbslq_u8(pass, regs.ordinals, regs.sentinel);

        for fold in &regs.folds {
            reduce = vminq_u8(reduce, vqtbl1q_u8(reduce, *fold));
        }

        vgetq_lane_u8::<0>(reduce)
    }
}

#[target_feature(enable = "neon")]
unsafe fn narrow_x1_impl(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_narrow();
        let sv = vdup_n_u8(s);
        for_each_x1(cdf, out, |word| {
            narrow_word(s, word, |_, word| reduce_narrow(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "neon")]
unsafe fn narrow_x8_impl(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_narrow();
        let sv = vdup_n_u8(s);
        for_each_x8(cdf, out, |word| {
            narrow_word(s, word, |_, word| reduce_narrow(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "neon")]
unsafe fn wide_x1_impl(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_wide();
        let sv = vdupq_n_u8(s);
        for_each_x1(cdf, out, |word| {
            wide_word(s, word, |_, word| reduce_wide(&regs, sv, word))
        });
    }
}

#[target_feature(enable = "neon")]
unsafe fn wide_x8_impl(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    unsafe {
        let s = sample_level(sample);
        let regs = load_wide();
        let sv = vdupq_n_u8(s);
        for_each_x8(cdf, out, |word| {
            wide_word(s, word, |_, word| reduce_wide(&regs, sv, word))
        });
    }
}

pub(super) fn narrow_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    // SAFETY: NEON is part of the aarch64 baseline
    unsafe { narrow_x1_impl(sample, cdf, out) }
}

pub(super) fn narrow_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    // SAFETY: NEON is part of the aarch64 baseline
    unsafe { narrow_x8_impl(sample, cdf, out) }
}

pub(super) fn wide_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    // SAFETY: NEON is part of the aarch64 baseline
    unsafe { wide_x1_impl(sample, cdf, out) }
}

pub(super) fn wide_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    // SAFETY: NEON is part of the aarch64 baseline
    unsafe { wide_x8_impl(sample, cdf, out) }
}
