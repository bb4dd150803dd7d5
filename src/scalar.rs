//! Branch-cascade classifier.
//!
//! The sample is replicated into every nibble of a word once per call, so each
//! boundary test is a single mask-and-compare against the CDF word. Comparing
//! the masked words compares the two nibbles, because both sides have zeros
//! everywhere else.

use crate::batch::{for_each_x1, for_each_x8};
use crate::core::cdf::{CATEGORY_OVERFLOW, CATEGORY_ZERO, Category, Cdf, sample_level};

const NIBBLE_MASKS: [u32; 8] = [
    0x0000_000F,
    0x0000_00F0,
    0x0000_0F00,
    0x0000_F000,
    0x000F_0000,
    0x00F0_0000,
    0x0F00_0000,
    0xF000_0000,
];

/// Sample magnitude copied into all eight nibbles.
#[inline(always)]
fn broadcast(sample: u8) -> u32 {
    u32::from(sample_level(sample)) * 0x1111_1111
}

#[inline(always)]
fn cascade(s: u32, cdf: u32) -> Category {
    let m = &NIBBLE_MASKS;
    if s & m[0] == 0 {
        CATEGORY_ZERO
    } else if cdf & m[0] >= s & m[0] {
        1
    } else if cdf & m[1] >= s & m[1] {
        2
    } else if cdf & m[2] >= s & m[2] {
        3
    } else if cdf & m[3] >= s & m[3] {
        4
    } else if cdf & m[4] >= s & m[4] {
        5
    } else if cdf & m[5] >= s & m[5] {
        6
    } else if cdf & m[6] >= s & m[6] {
        7
    } else if cdf & m[7] >= s & m[7] {
        8
    } else {
        CATEGORY_OVERFLOW
    }
}

/// Classify one word.
#[inline]
pub fn classify_one(sample: u8, cdf: Cdf) -> Category {
    cascade(broadcast(sample), cdf.bits())
}

/// Classify every word of `cdf` into the matching slot of `out`.
///
/// # Panics
///
/// Panics if `out.len() != cdf.len()`.
pub fn classify_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
    let s = broadcast(sample);
    for_each_x1(cdf, out, |word| cascade(s, word));
}

/// Classify `cdf` in groups of eight, packing each group's categories into
/// one word (category `j` at nibble `j`). Group `g` is written to `out[g]`.
///
/// # Panics
///
/// Panics if `cdf.len()` is not a multiple of 8 or `out.len() != cdf.len() / 8`.
pub fn classify_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
    let s = broadcast(sample);
    for_each_x8(cdf, out, |word| cascade(s, word));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cdf::{GROUP, classify, pack_categories};

    #[test]
    fn test_broadcast() {
        assert_eq!(broadcast(0), 0);
        assert_eq!(broadcast(6), 0x6666_6666);
        assert_eq!(broadcast(0xF6), 0x6666_6666);
    }

    #[test]
    fn test_known_cases() {
        let cases = [
            (4, 0x7654_3210, 5),
            (4, 0xFEA7_6510, 3),
            (4, 0x7644_4210, 4),
            (4, 0x3333_3210, 9),
            (1, 0x5544_3322, 1),
            (0, 0x5544_3300, 0),
            (0, 0x5544_3322, 0),
        ];
        for (sample, bits, expected) in cases {
            assert_eq!(
                classify_one(sample, Cdf::from_bits(bits)),
                expected,
                "sample {sample} cdf {bits:#010x}"
            );
        }
    }

    #[test]
    fn test_matches_rule_exhaustive_top_nibbles() {
        // Every value of the top two boundaries, lower six fixed ascending.
        for high in 0..=0xFFu32 {
            let cdf = Cdf::from_bits((high << 24) | 0x0054_3210);
            for sample in 0..16 {
                assert_eq!(classify_one(sample, cdf), classify(sample, cdf));
            }
        }
    }

    #[test]
    fn test_x1_fills_every_slot() {
        let cdf: Vec<Cdf> = [0x7654_3210, 0x3333_3210, 0xFFFF_FFFF]
            .into_iter()
            .map(Cdf::from_bits)
            .collect();
        let mut out = vec![0xAA; 3];
        classify_x1(4, &cdf, &mut out);
        assert_eq!(out, vec![5, 9, 1]);
    }

    #[test]
    fn test_x8_packs_groups_compactly() {
        let cdf: Vec<Cdf> = (0..16u32)
            .map(|i| Cdf::from_bits(0x7654_3210 + i))
            .collect();
        let mut single = vec![0; 16];
        classify_x1(3, &cdf, &mut single);

        let mut packed = vec![0; 2];
        classify_x8(3, &cdf, &mut packed);

        for (g, word) in packed.iter().enumerate() {
            let expected: [Category; GROUP] = single[g * GROUP..(g + 1) * GROUP]
                .try_into()
                .unwrap();
            assert_eq!(*word, pack_categories(expected));
        }
    }

    #[test]
    #[should_panic(expected = "multiple of 8")]
    fn test_x8_rejects_partial_group() {
        let cdf = vec![Cdf::default(); 12];
        let mut out = vec![0; 1];
        classify_x8(1, &cdf, &mut out);
    }

    #[test]
    #[should_panic(expected = "output length")]
    fn test_x1_rejects_short_output() {
        let cdf = vec![Cdf::default(); 4];
        let mut out = vec![0; 3];
        classify_x1(1, &cdf, &mut out);
    }
}
