// Splitting the input into per-worker byte ranges and running the workers.
//
// Each worker gets one contiguous range, opens and maps it on its own and
// hands back its finished table through the join handle. Nothing is shared
// while the workers run.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    hash::HashStrategy,
    scan::scan_range,
    table::AggregatorTable,
};

/// Half-open range of file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Cuts `file_len` bytes into at most `workers` ranges of `ceil(len / workers)`
/// bytes, the last one truncated. Ranges are not line aligned yet; the
/// scanner does that.
pub fn split_ranges(file_len: u64, workers: usize) -> Vec<ByteRange> {
    let workers = workers.max(1) as u64;
    let chunk_size = file_len.div_ceil(workers);
    if chunk_size == 0 {
        return vec![];
    }

    (0..workers)
        .map(|i| i * chunk_size)
        .take_while(|start| *start < file_len)
        .map(|start| ByteRange::new(start, (start + chunk_size).min(file_len)))
        .collect()
}

/// Scans `path` with one thread per range and returns the per-range tables
/// in range order. Every worker is joined before the first failure, if any,
/// is returned.
pub fn scan_parallel<H>(
    path: &Path,
    hasher: H,
    workers: usize,
    capacity: usize,
) -> Result<Vec<AggregatorTable<H>>>
where
    H: HashStrategy + Clone + Send + 'static,
{
    let file_len = fs::metadata(path).map_err(|e| Error::io(path, e))?.len();
    let ranges = split_ranges(file_len, workers);
    info!(
        file_len,
        workers = ranges.len(),
        hash = hasher.name(),
        "scanning"
    );

    let path: Arc<PathBuf> = Arc::new(path.to_path_buf());
    let handles: Vec<_> = ranges
        .into_iter()
        .map(|range| {
            let path = Arc::clone(&path);
            let hasher = hasher.clone();
            thread::spawn(move || scan_range(&path, file_len, range, hasher, capacity))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .enumerate()
        .map(|(worker, h)| {
            h.join()
                .unwrap_or(Err(Error::WorkerPanicked { worker }))
        })
        .collect();

    let mut tables = Vec::with_capacity(results.len());
    for (worker, result) in results.into_iter().enumerate() {
        match result {
            Ok(table) => tables.push(table),
            Err(err) => {
                warn!(worker, error = %err, "worker failed");
                return Err(err);
            }
        }
    }
    return Ok(tables);
}
