use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bench::{batch_rng, generate_batch, verify_batch};
use crate::core::cdf::GROUP;
use crate::validate::EQUIVALENCE_CASES;
use crate::*;

/// Random non-decreasing CDF: sorted boundaries drawn from 0-15.
fn random_monotonic(rng: &mut StdRng) -> Cdf {
    let mut boundaries = [0u8; 8];
    for b in boundaries.iter_mut() {
        *b = rng.random_range(0..=15);
    }
    boundaries.sort_unstable();
    Cdf::pack(boundaries)
}

fn monotonic_corpus(count: usize) -> Vec<Cdf> {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut corpus: Vec<Cdf> = (0..count).map(|_| random_monotonic(&mut rng)).collect();
    corpus.extend([
        Cdf::from_bits(0),
        Cdf::from_bits(0xFFFF_FFFF),
        Cdf::from_bits(0x7654_3210),
        Cdf::pack([15; 8]),
        Cdf::pack([0, 0, 0, 0, 0, 0, 0, 15]),
    ]);
    corpus
}

/// The category rule, stated directly on unpacked boundaries.
fn reference(sample: u8, cdf: Cdf) -> Category {
    if sample == 0 {
        return 0;
    }
    cdf.unpack()
        .iter()
        .position(|&c| c >= sample)
        .map_or(9, |i| i as Category + 1)
}

#[test]
fn test_concrete_cases() {
    for case in &EQUIVALENCE_CASES {
        assert_eq!(classify(case.sample, case.cdf), case.expected, "{}", case.name);
        assert_eq!(scalar::classify_one(case.sample, case.cdf), case.expected, "{}", case.name);
        for classifier in VectorClassifier::available() {
            assert_eq!(
                classifier.classify_one(case.sample, case.cdf),
                case.expected,
                "{} on {classifier}",
                case.name
            );
        }
    }
}

#[test]
fn test_every_variant_matches_rule() {
    let corpus = monotonic_corpus(2000);
    let classifiers = VectorClassifier::available();
    for &cdf in &corpus {
        for sample in 0..=15 {
            let expected = reference(sample, cdf);
            assert!(expected <= 9);
            assert_eq!(scalar::classify_one(sample, cdf), expected, "scalar {sample} {cdf}");
            for classifier in &classifiers {
                assert_eq!(
                    classifier.classify_one(sample, cdf),
                    expected,
                    "{classifier} {sample} {cdf}"
                );
            }
        }
    }
}

#[test]
fn test_zero_sample_is_zero_for_any_word() {
    let mut rng = StdRng::seed_from_u64(1);
    let classifiers = VectorClassifier::available();
    for _ in 0..5000 {
        // Arbitrary bits, monotonic or not.
        let cdf = Cdf::from_bits(rng.random());
        assert_eq!(scalar::classify_one(0, cdf), 0);
        for classifier in &classifiers {
            assert_eq!(classifier.classify_one(0, cdf), 0, "{classifier} {cdf}");
        }
    }
}

#[test]
fn test_overflow_iff_above_top_boundary() {
    for cdf in monotonic_corpus(500) {
        for sample in 1..=15 {
            let overflow = classify(sample, cdf) == CATEGORY_OVERFLOW;
            assert_eq!(overflow, sample > cdf.top(), "{sample} {cdf}");
        }
    }
}

#[test]
fn test_category_non_decreasing_in_sample() {
    for cdf in monotonic_corpus(500) {
        let categories: Vec<Category> = (0..=15).map(|s| classify(s, cdf)).collect();
        assert!(
            categories.windows(2).all(|w| w[0] <= w[1]),
            "{cdf}: {categories:?}"
        );
    }
}

#[test]
fn test_batched_equals_unbatched() {
    let corpus = monotonic_corpus(3000);
    let len = corpus.len() / GROUP * GROUP;
    let words = &corpus[..len];

    for sample in 0..=15 {
        let mut single = vec![0; len];
        let mut packed = vec![0u32; len / GROUP];

        scalar::classify_x1(sample, words, &mut single);
        scalar::classify_x8(sample, words, &mut packed);
        for (g, &word) in packed.iter().enumerate() {
            assert_eq!(unpack_categories(word), single[g * GROUP..(g + 1) * GROUP]);
        }

        for classifier in VectorClassifier::available() {
            let mut vector_single = vec![0; len];
            let mut vector_packed = vec![0u32; len / GROUP];
            classifier.classify_x1(sample, words, &mut vector_single);
            classifier.classify_x8(sample, words, &mut vector_packed);
            assert_eq!(vector_single, single, "{classifier} x1 sample {sample}");
            assert_eq!(vector_packed, packed, "{classifier} x8 sample {sample}");
        }
    }
}

#[test]
fn test_pack_unpack_round_trip() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..1000 {
        let mut boundaries = [0u8; 8];
        for b in boundaries.iter_mut() {
            *b = rng.random_range(0..=15);
        }
        assert_eq!(Cdf::pack(boundaries).unpack(), boundaries);

        let mut categories = [0 as Category; 8];
        for c in categories.iter_mut() {
            *c = rng.random_range(0..=9);
        }
        assert_eq!(unpack_categories(pack_categories(categories)), categories);
    }
}

#[test]
fn test_upper_sample_bits_ignored() {
    let cdf = Cdf::from_bits(0x7654_3210);
    for classifier in VectorClassifier::available() {
        assert_eq!(classifier.classify_one(0x14, cdf), 5, "{classifier}");
        assert_eq!(classifier.classify_one(0xF0, cdf), 0, "{classifier}");
    }
    assert_eq!(scalar::classify_one(0x14, cdf), 5);
}

#[test]
fn test_unaligned_input_accepted() {
    let buf = AlignedBuf::from_slice(monotonic_corpus(63).as_slice());
    // Offset by one word so the slice start is off the 16-byte boundary.
    let words = &buf[1..65];
    let mut expected = vec![0; words.len()];
    scalar::classify_x1(6, words, &mut expected);

    for classifier in VectorClassifier::available() {
        let mut out = vec![0; words.len()];
        classifier.classify_x1(6, words, &mut out);
        assert_eq!(out, expected, "{classifier}");

        let mut packed = vec![0u32; words.len() / GROUP];
        classifier.classify_x8(6, words, &mut packed);
        for (g, &word) in packed.iter().enumerate() {
            assert_eq!(unpack_categories(word), expected[g * GROUP..(g + 1) * GROUP]);
        }
    }
}

#[test]
fn test_generated_batches_verify_on_every_classifier() {
    for seed in 0..8 {
        let batch = generate_batch(&mut batch_rng(Some(seed)), 512);
        assert!(batch.iter().all(|cdf| cdf.is_well_formed()), "seed {seed}");
        for classifier in VectorClassifier::available() {
            for sample in 0..=15 {
                verify_batch(sample, &batch, &classifier).unwrap();
            }
        }
    }
}
