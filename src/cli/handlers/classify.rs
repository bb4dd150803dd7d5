use crate::cli::args::ClassifyArgs;
use crate::cli::halt;
use nibble_cdf::{VectorClassifier, agree_on_word};

pub fn handle(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let classifiers = VectorClassifier::available();

    for (index, cdf) in args.cdf.iter().enumerate() {
        // Every row printed below shares this category
        let category = match agree_on_word(index, args.sample, *cdf, &classifiers) {
            Ok(category) => category,
            Err(err) => halt(&err),
        };
        println!("{cdf}: {category}");

        println!("  {:<20} {}", "scalar", category);
        for classifier in &classifiers {
            println!("  {:<20} {}", classifier.to_string(), category);
        }
    }

    Ok(())
}
