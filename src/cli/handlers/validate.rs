use crate::cli::args::ValidateArgs;
use crate::cli::halt;
use nibble_cdf::validate::EQUIVALENCE_CASES;
use nibble_cdf::{Config, VectorClassifier, WidthPreference};

pub fn handle(args: ValidateArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if args.all_backends {
        match nibble_cdf::validate_all_backends() {
            Ok(count) => {
                println!(
                    "{} cases agree across {} classifiers",
                    EQUIVALENCE_CASES.len(),
                    count
                );
            }
            Err(err) => halt(&err),
        }
        return Ok(());
    }

    let width = args.width.map_or(config.vector.width, WidthPreference::from);
    let classifier = VectorClassifier::for_preference(width);
    if let Err(err) = nibble_cdf::validate_equivalence(&classifier) {
        halt(&err);
    }
    println!(
        "{} cases agree between scalar and {}",
        EQUIVALENCE_CASES.len(),
        classifier
    );
    Ok(())
}
