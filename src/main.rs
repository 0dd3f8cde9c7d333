// Computes min/mean/max per key of a `<key>;<value>` file.
//
// - Running:
//      - `cargo run --release -- measurements.txt`
//      - `RUST_LOG=debug` (or `-v`) for per-worker details on stderr
//
// - Profiling:
//      - `cargo build --profile profiling`
//      - `samply record ./target/profiling/brc_stats measurements.txt`
//      - heap: `cargo run --release --features dhat-heap -- measurements.txt`

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use brc_stats::{
    Config, HashAlgorithm,
    config::{DEFAULT_CAPACITY, DEFAULT_HASH},
    report::compare_reports,
};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Debug, Parser)]
#[command(version, about = "Per-key min/mean/max of a `<key>;<value>` file")]
struct Args {
    /// Input file
    #[arg(default_value = "measurements.txt")]
    path: PathBuf,

    /// Worker threads [default: available cores]
    #[arg(short, long)]
    workers: Option<NonZeroUsize>,

    /// Maximum number of distinct keys
    #[arg(long, default_value_t = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))]
    capacity: NonZeroUsize,

    /// Hash function for the aggregation table
    #[arg(long, value_enum, default_value_t = DEFAULT_HASH)]
    hash: HashAlgorithm,

    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Also store the report in this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compare the report against a reference report
    #[arg(short, long)]
    expected: Option<PathBuf>,

    /// More logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = Args::parse();
    init_logging(args.verbose);

    let start = Instant::now();

    let mut config = Config::new(&args.path)
        .with_capacity(args.capacity)
        .with_hash(args.hash, args.seed);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let report = brc_stats::run(&config)
        .with_context(|| format!("failed to aggregate {}", args.path.display()))?;
    let results = report.to_string();
    println!("{results}");

    eprintln!("Run completed in: {} seconds", start.elapsed().as_secs_f32());

    if let Some(output) = &args.output {
        store_result(output, &results)?;
    }
    if let Some(expected) = &args.expected {
        check_correct(expected, &results)?;
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn store_result(path: &Path, results: &str) -> Result<()> {
    std::fs::write(path, results)
        .with_context(|| format!("failed to store results in {}", path.display()))?;
    eprintln!("Results stored in \"{}\"", path.display());
    Ok(())
}

fn check_correct(path: &Path, results: &str) -> Result<()> {
    let correct = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read expected results {}", path.display()))?;

    let mismatches = compare_reports(results, &correct);
    if mismatches.is_empty() {
        eprintln!("PASSED!");
        return Ok(());
    }

    eprintln!("ERROR, output does not match expected!");
    for mismatch in &mismatches {
        eprintln!("{mismatch}");
    }
    anyhow::bail!("{} difference(s) against {}", mismatches.len(), path.display());
}
