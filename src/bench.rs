// Hash quality and speed measurements over a corpus of real key names.

use std::{
    collections::{HashMap, HashSet},
    fs,
    hint::black_box,
    path::Path,
    time::{Duration, Instant},
};

use rand::Rng;
use tracing::debug;

use crate::{
    error::{Error, FormatErrorKind, Result},
    hash::{HashStrategy, Murmur3, Polynomial, XxHash32, XxHash32Stream, polynomial_naive},
    table::{KeyRef, MAX_KEY_LEN, NameArena},
};

/// Distinct names packed into one arena.
pub struct NameCorpus {
    arena: NameArena,
    names: Vec<KeyRef>,
}

impl NameCorpus {
    pub fn load(path: &Path, dedup: bool) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let corpus = Self::parse(&text, dedup)?;
        debug!(path = %path.display(), names = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// One name per line; anything after a `;` is ignored, as are blank lines
    /// and `#` comments.
    pub fn parse(text: &str, dedup: bool) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut arena = NameArena::with_capacity(text.len());
        let mut names = vec![];

        let mut offset = 0u64;
        for line in text.split_inclusive('\n') {
            let line_offset = offset;
            offset += line.len() as u64;

            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let name = line.split_once(';').map_or(line, |(name, _)| name);
            if name.is_empty() {
                return Err(Error::format(line_offset, FormatErrorKind::EmptyKey));
            }
            if name.len() > MAX_KEY_LEN {
                return Err(Error::format(
                    line_offset,
                    FormatErrorKind::KeyTooLong { len: name.len() },
                ));
            }
            if dedup && !seen.insert(name) {
                continue;
            }
            names.push(arena.push(name.as_bytes())?);
        }

        Ok(Self { arena, names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> &[u8] {
        self.arena.get(self.names[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.names.iter().map(|k| self.arena.get(*k))
    }
}

/// A fixed input with a known hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorCheck {
    pub hash: &'static str,
    pub input: &'static str,
    pub expected: u32,
    pub actual: u32,
}

impl VectorCheck {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

pub fn check_vectors() -> Vec<VectorCheck> {
    let mut stream = XxHash32Stream::new(0);
    stream.update(b"Gail");
    stream.update(b"lard");

    vec![
        VectorCheck {
            hash: "murmur3",
            input: "Gaillard",
            expected: 2611759141,
            actual: Murmur3::new(0).hash(b"Gaillard"),
        },
        VectorCheck {
            hash: "xxhash32",
            input: "Gaillard",
            expected: 2959073022,
            actual: XxHash32::new(0).hash(b"Gaillard"),
        },
        VectorCheck {
            hash: "xxhash32-stream",
            input: "Gaillard",
            expected: 2959073022,
            actual: stream.finish(),
        },
        VectorCheck {
            hash: "polynomial",
            input: "Gaillard",
            expected: polynomial_naive(b"Gaillard"),
            actual: Polynomial.hash(b"Gaillard"),
        },
    ]
}

/// Names for which two implementations of the same hash disagree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrossCheck {
    pub polynomial: Vec<String>,
    pub xxhash32_stream: Vec<String>,
}

impl CrossCheck {
    pub fn passed(&self) -> bool {
        self.polynomial.is_empty() && self.xxhash32_stream.is_empty()
    }
}

/// Checks the unrolled polynomial against the naive loop, and streaming
/// xxHash32 (fed in 3 byte pieces) against the one-shot version.
pub fn cross_check(corpus: &NameCorpus, seed: u32) -> CrossCheck {
    let one_shot = XxHash32::new(seed);
    let mut stream = XxHash32Stream::new(seed);
    let mut result = CrossCheck::default();

    for name in corpus.iter() {
        if Polynomial.hash(name) != polynomial_naive(name) {
            result.polynomial.push(String::from_utf8_lossy(name).into_owned());
        }

        stream.reset();
        for piece in name.chunks(3) {
            stream.update(piece);
        }
        if stream.finish() != one_shot.hash(name) {
            result.xxhash32_stream.push(String::from_utf8_lossy(name).into_owned());
        }
    }
    return result;
}

/// How many distinct names share each hash value.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionStats {
    pub max: usize,
    pub avg: f64,
    pub distinct_hashes: usize,
    /// Groups of two or more names with the same hash, largest first.
    pub groups: Vec<Vec<String>>,
}

pub fn collisions<H: HashStrategy + ?Sized>(hasher: &H, corpus: &NameCorpus) -> CollisionStats {
    let mut by_hash: HashMap<u32, HashSet<&[u8]>> = HashMap::with_capacity(corpus.len());
    for name in corpus.iter() {
        by_hash.entry(hasher.hash(name)).or_default().insert(name);
    }

    let max = by_hash.values().map(|names| names.len()).max().unwrap_or(0);
    let avg = if by_hash.is_empty() {
        0.0
    } else {
        by_hash.values().map(|names| names.len()).sum::<usize>() as f64 / by_hash.len() as f64
    };

    let mut groups: Vec<Vec<String>> = by_hash
        .values()
        .filter(|names| names.len() > 1)
        .map(|names| {
            let mut group: Vec<_> = names
                .iter()
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .collect();
            group.sort();
            group
        })
        .collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    CollisionStats {
        max,
        avg,
        distinct_hashes: by_hash.len(),
        groups,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    pub iterations: u64,
    pub elapsed: Duration,
    /// Folded hash values, so the hashing cannot be skipped.
    pub checksum: u32,
}

impl Throughput {
    pub fn hashes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.iterations as f64 / secs
    }
}

/// Hashes `iterations` names picked uniformly at random from `corpus`.
pub fn throughput<H: HashStrategy + ?Sized, R: Rng>(
    hasher: &H,
    corpus: &NameCorpus,
    iterations: u64,
    rng: &mut R,
) -> Throughput {
    let mut checksum = 0u32;
    let start = Instant::now();
    if !corpus.is_empty() {
        for _ in 0..iterations {
            let name = corpus.get(rng.random_range(0..corpus.len()));
            checksum = checksum.wrapping_add(black_box(hasher.hash(black_box(name))));
        }
    }
    Throughput {
        iterations,
        elapsed: start.elapsed(),
        checksum,
    }
}
