//! Buffer walking shared by every classifier: one category per word for the
//! single-item entry points, one packed word per group of eight for the
//! batched ones.

use crate::core::cdf::{Category, Cdf, GROUP};

/// Apply `classify` to each word, writing `out[i]` for `cdf[i]`.
///
/// # Panics
///
/// Panics if `out.len() != cdf.len()`.
#[inline(always)]
pub(crate) fn for_each_x1<F>(cdf: &[Cdf], out: &mut [Category], mut classify: F)
where
    F: FnMut(u32) -> Category,
{
    assert_eq!(out.len(), cdf.len(), "output length must match input length");

    for (slot, word) in out.iter_mut().zip(cdf) {
        *slot = classify(word.bits());
    }
}

/// Apply `classify` to groups of eight words; group `g` is packed into
/// `out[g]` with category `j` at nibble `j`.
///
/// # Panics
///
/// Panics if `cdf.len()` is not a multiple of 8 or `out.len() != cdf.len() / 8`.
#[inline(always)]
pub(crate) fn for_each_x8<F>(cdf: &[Cdf], out: &mut [u32], mut classify: F)
where
    F: FnMut(u32) -> Category,
{
    assert!(
        cdf.len().is_multiple_of(GROUP),
        "batched input length must be a multiple of {GROUP}"
    );
    assert_eq!(
        out.len(),
        cdf.len() / GROUP,
        "batched output must hold one word per group"
    );

    for (slot, group) in out.iter_mut().zip(cdf.chunks_exact(GROUP)) {
        let mut packed = 0u32;
        for (j, word) in group.iter().enumerate() {
            packed |= u32::from(classify(word.bits())) << (j * 4);
        }
        *slot = packed;
    }
}
