// 32-bit hash functions over raw key bytes.
//
// Everything that hashes keys (the aggregation table, the hash benchmark)
// goes through `HashStrategy`, so the concrete algorithm is picked at run
// time with `HashAlgorithm` and dispatched through `AnyHash`.

mod murmur3;
mod polynomial;
mod xxh32;

use std::fmt;

pub use murmur3::Murmur3;
pub use polynomial::{Polynomial, polynomial_naive};
pub use xxh32::{XxHash32, XxHash32Stream};

pub trait HashStrategy {
    fn hash(&self, bytes: &[u8]) -> u32;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum HashAlgorithm {
    Polynomial,
    Murmur3,
    #[value(name = "xxhash32")]
    XxHash32,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Polynomial,
        HashAlgorithm::Murmur3,
        HashAlgorithm::XxHash32,
    ];

    pub fn with_seed(self, seed: u32) -> AnyHash {
        match self {
            HashAlgorithm::Polynomial => AnyHash::Polynomial(Polynomial),
            HashAlgorithm::Murmur3 => AnyHash::Murmur3(Murmur3::new(seed)),
            HashAlgorithm::XxHash32 => AnyHash::XxHash32(XxHash32::new(seed)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.with_seed(0).name())
    }
}

/// One of the built-in strategies, matched on per call instead of going
/// through a vtable.
#[derive(Debug, Clone, Copy)]
pub enum AnyHash {
    Polynomial(Polynomial),
    Murmur3(Murmur3),
    XxHash32(XxHash32),
}

impl HashStrategy for AnyHash {
    #[inline(always)]
    fn hash(&self, bytes: &[u8]) -> u32 {
        match self {
            AnyHash::Polynomial(h) => h.hash(bytes),
            AnyHash::Murmur3(h) => h.hash(bytes),
            AnyHash::XxHash32(h) => h.hash(bytes),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyHash::Polynomial(h) => h.name(),
            AnyHash::Murmur3(h) => h.name(),
            AnyHash::XxHash32(h) => h.name(),
        }
    }
}

#[inline(always)]
pub(crate) fn read_u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_concrete_types() {
        let key = b"Gaillard";
        assert_eq!(HashAlgorithm::Murmur3.with_seed(0).hash(key), Murmur3::new(0).hash(key));
        assert_eq!(HashAlgorithm::XxHash32.with_seed(7).hash(key), XxHash32::new(7).hash(key));
        assert_eq!(HashAlgorithm::Polynomial.with_seed(99).hash(key), Polynomial.hash(key));
    }

    #[test]
    fn names_are_stable() {
        let names: Vec<_> = HashAlgorithm::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["polynomial", "murmur3", "xxhash32"]);
    }
}
