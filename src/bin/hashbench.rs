// Compares the table hash functions on a corpus of key names.
//
//      cargo run --release --bin hashbench -- data/weather_stations.csv
//
// For every hash: reference vector checks, how many names share a hash
// value, and hashes per second over randomly picked names.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

use brc_stats::{
    HashAlgorithm, HashStrategy,
    bench::{NameCorpus, check_vectors, collisions, cross_check, throughput},
};

#[derive(Debug, Parser)]
#[command(version, about = "Collision and throughput comparison of the key hashes")]
struct Args {
    /// Name corpus, one name per line (text after ';' is ignored)
    corpus: PathBuf,

    /// Hashes per throughput round
    #[arg(short, long, default_value_t = 10_000_000)]
    iterations: u64,

    /// Throughput rounds; the first one doubles as warm up
    #[arg(short, long, default_value_t = 2)]
    rounds: u32,

    /// Keep duplicate names
    #[arg(long)]
    no_dedup: bool,

    /// Hash seed
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Seed for picking names [default: random]
    #[arg(long)]
    rng_seed: Option<u64>,

    /// List every group of colliding names
    #[arg(long)]
    show_collisions: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let corpus = NameCorpus::load(&args.corpus, !args.no_dedup)
        .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;
    ensure!(!corpus.is_empty(), "corpus {} has no names", args.corpus.display());
    println!("{} names", corpus.len());

    let mut failed = false;
    for check in check_vectors() {
        println!(
            "{} {:?}: expected {} got {} {}",
            check.hash,
            check.input,
            check.expected,
            check.actual,
            if check.passed() { "ok" } else { "FAILED" }
        );
        failed |= !check.passed();
    }

    let cross = cross_check(&corpus, args.seed);
    for name in &cross.polynomial {
        println!("Mismatch for {name} (polynomial unrolled vs naive)");
    }
    for name in &cross.xxhash32_stream {
        println!("Mismatch for {name} (xxhash32 stream vs one-shot)");
    }
    failed |= !cross.passed();

    let hashers: Vec<_> = HashAlgorithm::ALL
        .iter()
        .map(|algo| algo.with_seed(args.seed))
        .collect();

    for hasher in &hashers {
        let stats = collisions(hasher, &corpus);
        println!(
            "{} max={} avg={:.4} distinct={}",
            hasher.name(),
            stats.max,
            stats.avg,
            stats.distinct_hashes
        );
        if args.show_collisions {
            for group in &stats.groups {
                println!("    {}", group.join(", "));
            }
        }
    }

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    for round in 1..=args.rounds {
        for hasher in &hashers {
            let t = throughput(hasher, &corpus, args.iterations, &mut rng);
            println!(
                "round {round} {} time={}ms rate={:.0}/s checksum={:08x}",
                hasher.name(),
                t.elapsed.as_millis(),
                t.hashes_per_sec(),
                t.checksum
            );
        }
    }

    ensure!(!failed, "hash self checks failed");
    Ok(())
}
