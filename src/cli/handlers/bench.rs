use crate::cli::args::BenchArgs;
use crate::cli::halt;
use nibble_cdf::{BenchError, Config, VectorClassifier, WidthPreference, run_benchmark};

pub fn handle(args: BenchArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Flags override the merged file configuration
    let mut bench = config.benchmark.clone();
    if let Some(iterations) = args.iterations {
        bench.iterations = iterations;
    }
    if let Some(batch_len) = args.batch_len {
        bench.batch_len = batch_len;
    }
    if let Some(sample) = args.sample {
        bench.sample = sample;
    }
    if args.seed.is_some() {
        bench.seed = args.seed;
    }

    let width = args.width.map_or(config.vector.width, WidthPreference::from);
    let classifier = VectorClassifier::for_preference(width);

    match run_benchmark(&bench, &classifier) {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(BenchError::Equivalence(err)) => halt(&err),
        Err(err) => Err(err.into()),
    }
}
