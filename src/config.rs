use std::{num::NonZeroUsize, path::PathBuf, thread};

use crate::hash::HashAlgorithm;

/// Upper bound on distinct keys in one input.
pub const DEFAULT_CAPACITY: usize = 10_000;

pub const DEFAULT_HASH: HashAlgorithm = HashAlgorithm::XxHash32;

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub workers: NonZeroUsize,
    pub capacity: NonZeroUsize,
    pub hash: HashAlgorithm,
    pub seed: u32,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workers: default_workers(),
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            hash: DEFAULT_HASH,
            seed: 0,
        }
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm, seed: u32) -> Self {
        self.hash = hash;
        self.seed = seed;
        self
    }
}

/// One worker per available core.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::new("measurements.txt");
        assert_eq!(cfg.capacity.get(), DEFAULT_CAPACITY);
        assert_eq!(cfg.hash, HashAlgorithm::XxHash32);
        assert_eq!(cfg.seed, 0);
        assert!(cfg.workers.get() >= 1);
    }

    #[test]
    fn builders_override() {
        let cfg = Config::new("x")
            .with_workers(NonZeroUsize::new(3).unwrap())
            .with_capacity(NonZeroUsize::new(5).unwrap())
            .with_hash(HashAlgorithm::Murmur3, 42);
        assert_eq!(cfg.workers.get(), 3);
        assert_eq!(cfg.capacity.get(), 5);
        assert_eq!(cfg.hash, HashAlgorithm::Murmur3);
        assert_eq!(cfg.seed, 42);
    }
}
