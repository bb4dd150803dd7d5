//! Equivalence checks between the scalar cascade and the vector pipeline.
//!
//! A disagreement is a defect in one of the classifiers, never a property of
//! the input. Checks stop at the first one; callers must not continue past an
//! [`EquivalenceError`].

use tracing::{debug, error};

use crate::core::cdf::{Category, Cdf};
use crate::scalar;
use crate::simd::VectorClassifier;

/// One hand-authored case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquivalenceCase {
    pub name: &'static str,
    pub sample: u8,
    pub cdf: Cdf,
    pub expected: Category,
}

/// Adversarial well-formed inputs with known answers.
pub const EQUIVALENCE_CASES: [EquivalenceCase; 7] = [
    EquivalenceCase {
        name: "exact boundary match",
        sample: 4,
        cdf: Cdf::from_bits(0x7654_3210),
        expected: 5,
    },
    EquivalenceCase {
        name: "no exact match",
        sample: 4,
        cdf: Cdf::from_bits(0xFEA7_6510),
        expected: 3,
    },
    EquivalenceCase {
        name: "repeated boundary equal to sample",
        sample: 4,
        cdf: Cdf::from_bits(0x7644_4210),
        expected: 4,
    },
    EquivalenceCase {
        name: "sample above every boundary",
        sample: 4,
        cdf: Cdf::from_bits(0x3333_3210),
        expected: 9,
    },
    EquivalenceCase {
        name: "sample at or below lowest boundary",
        sample: 1,
        cdf: Cdf::from_bits(0x5544_3322),
        expected: 1,
    },
    EquivalenceCase {
        name: "zero sample with zero boundary",
        sample: 0,
        cdf: Cdf::from_bits(0x5544_3300),
        expected: 0,
    },
    EquivalenceCase {
        name: "zero sample without zero boundary",
        sample: 0,
        cdf: Cdf::from_bits(0x5544_3322),
        expected: 0,
    },
];

/// A detected disagreement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquivalenceError {
    #[error(
        "{case}: sample {sample} cdf {cdf} expected category {expected}, scalar gave {scalar}, {classifier} gave {vector}"
    )]
    Expected {
        case: &'static str,
        classifier: String,
        sample: u8,
        cdf: Cdf,
        expected: Category,
        scalar: Category,
        vector: Category,
    },
    #[error("{path} mismatch at index {index}: sample {sample} cdf {cdf}, scalar {scalar} vs {classifier} {vector}")]
    Single {
        path: &'static str,
        classifier: String,
        index: usize,
        sample: u8,
        cdf: Cdf,
        scalar: Category,
        vector: Category,
    },
    #[error(
        "{path} mismatch in group {group}: sample {sample}, scalar {scalar:#010x} vs {classifier} {vector:#010x}"
    )]
    Batched {
        path: &'static str,
        classifier: String,
        group: usize,
        sample: u8,
        scalar: u32,
        vector: u32,
    },
}

/// Run the fixed table against `vector` and the scalar cascade.
pub fn validate_equivalence(vector: &VectorClassifier) -> Result<(), EquivalenceError> {
    for case in &EQUIVALENCE_CASES {
        let scalar = scalar::classify_one(case.sample, case.cdf);
        let vectored = vector.classify_one(case.sample, case.cdf);

        if scalar != case.expected || vectored != scalar {
            let err = EquivalenceError::Expected {
                case: case.name,
                classifier: vector.to_string(),
                sample: case.sample,
                cdf: case.cdf,
                expected: case.expected,
                scalar,
                vector: vectored,
            };
            error!(%err, "classifier disagreement");
            return Err(err);
        }
    }

    debug!(classifier = %vector, cases = EQUIVALENCE_CASES.len(), "equivalence table passed");
    Ok(())
}

/// Run the fixed table against every classifier this CPU can run.
pub fn validate_all_backends() -> Result<usize, EquivalenceError> {
    validate_classifiers(&VectorClassifier::available())
}

/// Run the fixed table against each of `classifiers` in turn, stopping at the
/// first disagreement. Returns how many were checked.
pub fn validate_classifiers(classifiers: &[VectorClassifier]) -> Result<usize, EquivalenceError> {
    for classifier in classifiers {
        validate_equivalence(classifier)?;
    }
    Ok(classifiers.len())
}

/// Classify the `index`-th word of an ad hoc list with the scalar cascade and
/// every classifier in `classifiers`, returning the category they share.
pub fn agree_on_word(
    index: usize,
    sample: u8,
    cdf: Cdf,
    classifiers: &[VectorClassifier],
) -> Result<Category, EquivalenceError> {
    let scalar = scalar::classify_one(sample, cdf);
    for vector in classifiers {
        let vectored = vector.classify_one(sample, cdf);
        if vectored != scalar {
            let err = EquivalenceError::Single {
                path: "single word",
                classifier: vector.to_string(),
                index,
                sample,
                cdf,
                scalar,
                vector: vectored,
            };
            error!(%err, "classifier disagreement");
            return Err(err);
        }
    }
    Ok(scalar)
}

/// Compare single-item results element by element.
pub(crate) fn compare_single(
    path: &'static str,
    vector: &VectorClassifier,
    sample: u8,
    cdf: &[Cdf],
    scalar: &[Category],
    vectored: &[Category],
) -> Result<(), EquivalenceError> {
    let mismatch = scalar
        .iter()
        .zip(vectored)
        .position(|(a, b)| a != b);

    match mismatch {
        None => Ok(()),
        Some(index) => {
            let err = EquivalenceError::Single {
                path,
                classifier: vector.to_string(),
                index,
                sample,
                cdf: cdf[index],
                scalar: scalar[index],
                vector: vectored[index],
            };
            error!(%err, "classifier disagreement");
            Err(err)
        }
    }
}

/// Compare packed group results word by word.
pub(crate) fn compare_batched(
    path: &'static str,
    vector: &VectorClassifier,
    sample: u8,
    scalar: &[u32],
    vectored: &[u32],
) -> Result<(), EquivalenceError> {
    let mismatch = scalar
        .iter()
        .zip(vectored)
        .position(|(a, b)| a != b);

    match mismatch {
        None => Ok(()),
        Some(group) => {
            let err = EquivalenceError::Batched {
                path,
                classifier: vector.to_string(),
                group,
                sample,
                scalar: scalar[group],
                vector: vectored[group],
            };
            error!(%err, "classifier disagreement");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::{batch_rng, generate_batch, verify_batch};
    use crate::core::cdf::{GROUP, classify, pack_categories, unpack_categories};
    use crate::simd::{Backend, RegisterWidth, X1Fn, X8Fn};

    /// Reports one category too high for every word.
    fn off_by_one_x1(sample: u8, cdf: &[Cdf], out: &mut [Category]) {
        scalar::classify_x1(sample, cdf, out);
        for category in out.iter_mut() {
            *category += 1;
        }
    }

    /// Correct categories, but group 1 is packed in reverse nibble order.
    fn reversed_group_x8(sample: u8, cdf: &[Cdf], out: &mut [u32]) {
        scalar::classify_x8(sample, cdf, out);
        if let Some(word) = out.get_mut(1) {
            let mut categories = unpack_categories(*word);
            categories.reverse();
            *word = pack_categories(categories);
        }
    }

    fn faulty(x1: X1Fn, x8: X8Fn) -> VectorClassifier {
        VectorClassifier {
            width: RegisterWidth::Wide,
            backend: Backend::Portable,
            x1,
            x8,
        }
    }

    /// Word `j` of each group lands in category `j + 1` for sample 4.
    fn staircase(groups: usize) -> Vec<Cdf> {
        (0..groups * GROUP)
            .map(|n| {
                let step = n % GROUP;
                Cdf::pack(std::array::from_fn(|i| if i < step { 0 } else { 15 }))
            })
            .collect()
    }

    #[test]
    fn test_cases_are_well_formed_and_correct() {
        for case in &EQUIVALENCE_CASES {
            assert!(case.cdf.is_well_formed(), "{}", case.name);
            assert_eq!(classify(case.sample, case.cdf), case.expected, "{}", case.name);
        }
    }

    #[test]
    fn test_detected_classifier_passes() {
        validate_equivalence(&VectorClassifier::detect()).unwrap();
    }

    #[test]
    fn test_every_backend_passes() {
        let checked = validate_all_backends().unwrap();
        assert!(checked >= RegisterWidth::ALL.len());
    }

    #[test]
    fn test_compare_single_reports_first_mismatch() {
        let vector = VectorClassifier::portable(RegisterWidth::Wide);
        let cdf = [Cdf::from_bits(1), Cdf::from_bits(2), Cdf::from_bits(3)];
        let err = compare_single("x1", &vector, 4, &cdf, &[1, 2, 3], &[1, 5, 7]).unwrap_err();
        match err {
            EquivalenceError::Single {
                index, scalar, vector, cdf, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!((scalar, vector), (2, 5));
                assert_eq!(cdf.bits(), 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_compare_batched_formats_words() {
        let vector = VectorClassifier::portable(RegisterWidth::Narrow);
        let err = compare_batched("x8", &vector, 6, &[0x11, 0x22], &[0x11, 0x23]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("group 1"));
        assert!(message.contains("0x00000022"));
        assert!(message.contains("narrow (portable)"));
    }

    #[test]
    fn test_validate_equivalence_reports_first_case() {
        let vector = faulty(off_by_one_x1, scalar::classify_x8);
        match validate_equivalence(&vector).unwrap_err() {
            EquivalenceError::Expected {
                case,
                expected,
                scalar,
                vector,
                ..
            } => {
                assert_eq!(case, EQUIVALENCE_CASES[0].name);
                assert_eq!((expected, scalar, vector), (5, 5, 6));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_validate_classifiers_stops_at_disagreement() {
        let good = VectorClassifier::portable(RegisterWidth::Narrow);
        assert_eq!(validate_classifiers(&[good]).unwrap(), 1);

        let bad = faulty(off_by_one_x1, scalar::classify_x8);
        let err = validate_classifiers(&[good, bad]).unwrap_err();
        assert!(matches!(err, EquivalenceError::Expected { .. }));
    }

    #[test]
    fn test_verify_batch_catches_wrong_single_results() {
        let batch = generate_batch(&mut batch_rng(Some(11)), 64);
        let vector = faulty(off_by_one_x1, scalar::classify_x8);
        match verify_batch(6, &batch, &vector).unwrap_err() {
            EquivalenceError::Single {
                index,
                scalar,
                vector,
                ..
            } => {
                assert_eq!(index, 0);
                assert_eq!(vector, scalar + 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_verify_batch_catches_group_nibble_order() {
        let batch = staircase(2);
        let vector = faulty(scalar::classify_x1, reversed_group_x8);
        match verify_batch(4, &batch, &vector).unwrap_err() {
            EquivalenceError::Batched {
                path,
                group,
                scalar,
                vector,
                ..
            } => {
                assert_eq!(path, "batched");
                assert_eq!(group, 1);
                assert_eq!(scalar, 0x8765_4321);
                assert_eq!(vector, 0x1234_5678);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_agree_on_word() {
        let cdf = Cdf::from_bits(0x7654_3210);
        assert_eq!(agree_on_word(0, 4, cdf, &VectorClassifier::available()).unwrap(), 5);

        let bad = faulty(off_by_one_x1, scalar::classify_x8);
        match agree_on_word(3, 4, cdf, &[bad]).unwrap_err() {
            EquivalenceError::Single {
                index,
                scalar,
                vector,
                ..
            } => assert_eq!((index, scalar, vector), (3, 5, 6)),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
