mod args;
mod global;
mod handlers;

use clap::Parser;
use nibble_cdf::{Config, EquivalenceError, VectorClassifier};
use tracing::error;
use tracing_subscriber::EnvFilter;

use args::{BenchArgs, Commands};
use global::GlobalArgs;

#[derive(Parser)]
#[command(name = "nibble-cdf")]
#[command(version)]
#[command(about = "Classify samples against nibble-packed CDFs and compare scalar and SIMD throughput", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Without a subcommand: validate, then benchmark
    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(global: &GlobalArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(global.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Stop the process on a classifier disagreement.
pub(crate) fn halt(err: &EquivalenceError) -> ! {
    error!(%err, "scalar and vector classification disagree");
    eprintln!("fatal: {err}");
    std::process::abort()
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    // Load configuration with user overrides
    let config = Config::load_with_overrides(cli.global.config.as_deref())?;

    match cli.command {
        Some(Commands::Validate(args)) => handlers::validate::handle(args, &config),
        Some(Commands::Bench(args)) => handlers::bench::handle(args, &config),
        Some(Commands::Classify(args)) => handlers::classify::handle(args),
        Some(Commands::Config) => handlers::config::handle(&config),
        None => {
            let classifier = VectorClassifier::for_preference(config.vector.width);
            if let Err(err) = nibble_cdf::validate_equivalence(&classifier) {
                halt(&err);
            }
            handlers::bench::handle(BenchArgs::default(), &config)
        }
    }
}
