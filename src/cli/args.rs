use clap::{Args, Subcommand, ValueEnum};
use nibble_cdf::{Cdf, WidthPreference};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every classifier against the known-answer table
    Validate(ValidateArgs),

    /// Measure throughput of scalar and vector classification
    Bench(BenchArgs),

    /// Classify a sample against one or more CDF words
    Classify(ClassifyArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the equivalence check
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Check every backend this CPU supports, not just the selected one
    #[arg(long)]
    pub all_backends: bool,

    /// Vector register width to validate
    #[arg(long, value_enum)]
    pub width: Option<WidthArg>,
}

/// Arguments for the throughput benchmark
#[derive(Args, Debug, Default)]
pub struct BenchArgs {
    /// Timed invocations per variant
    #[arg(long, value_name = "N")]
    pub iterations: Option<u64>,

    /// CDF words per batch (multiple of 8)
    #[arg(long, value_name = "N")]
    pub batch_len: Option<usize>,

    /// Sample classified against every word (0-15)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub sample: Option<u8>,

    /// Seed for the batch generator (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vector register width
    #[arg(long, value_enum)]
    pub width: Option<WidthArg>,
}

/// Arguments for one-off classification
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Sample magnitude (0-15)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=15))]
    pub sample: u8,

    /// CDF words in hex, e.g. 0x76543210
    #[arg(value_name = "CDF_HEX", required = true)]
    pub cdf: Vec<Cdf>,
}

/// Register width (CLI enum)
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum WidthArg {
    Auto,
    Narrow,
    Wide,
}

impl From<WidthArg> for WidthPreference {
    fn from(cli: WidthArg) -> Self {
        match cli {
            WidthArg::Auto => WidthPreference::Auto,
            WidthArg::Narrow => WidthPreference::Narrow,
            WidthArg::Wide => WidthPreference::Wide,
        }
    }
}
