// # Rules and limits
//
// - Format of the input file:
//      - `<string: key>;<double: value>`, one record per line
//      - eg: "Hamburg;12.0"
//
// - Key:
//      - non empty UTF-8 string of at most 100 bytes
//      - containing neither ; nor \n characters
//
// - Value:
//      - `-?d{1,2}.d`, between -99.9 and 99.9, always one fractional digit
//
// - At most `Config::capacity` distinct keys (10,000 by default)
// - Line endings are \n; the last line may omit it
// - Rounding is half up (towards positive) to one decimal
//
// - Output format:
//      - `<key>=<min>/<mean>/<max>`
//      - entries are comma+space separated (separator = ", ")
//      - result is enclosed in curly braces "{<result here>}"

pub mod accumulator;
pub mod bench;
pub mod config;
pub mod error;
pub mod hash;
pub mod parse;
pub mod partition;
pub mod report;
pub mod scan;
pub mod table;

pub use accumulator::Accumulator;
pub use config::Config;
pub use error::{Error, FormatErrorKind, Result};
pub use hash::{AnyHash, HashAlgorithm, HashStrategy};
pub use report::{Report, ResultRow};

/// Aggregates the file named by `config` into a sorted report.
pub fn run(config: &Config) -> Result<Report> {
    let hasher = config.hash.with_seed(config.seed);
    let tables = partition::scan_parallel(
        &config.path,
        hasher,
        config.workers.get(),
        config.capacity.get(),
    )?;
    let merged = report::merge_tables(tables)?;
    // keys spread over several workers can fit every worker table and still
    // be too many in total
    if merged.len() > config.capacity.get() {
        return Err(Error::Capacity {
            capacity: config.capacity.get(),
        });
    }
    return Ok(Report::from_accumulators(&merged));
}
