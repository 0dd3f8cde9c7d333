// Fixed-capacity aggregation table keyed by raw key bytes.
//
// Keys are copied once into a shared `NameArena` and referred to by
// `KeyRef`, so a new key costs no heap allocation. Buckets are chained:
// `buckets[hash % capacity]` holds the index of the first entry, and each
// entry links to the next one with the same bucket. The table never grows;
// going past `capacity` distinct keys is an error.

use crate::{
    accumulator::Accumulator,
    error::{Error, Result},
    hash::HashStrategy,
};

pub const MAX_KEY_LEN: usize = 100;

const NO_ENTRY: u32 = u32::MAX;

/// Location of a key's bytes inside a [`NameArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRef {
    offset: u32,
    len: u32,
}

impl KeyRef {
    fn at(offset: usize, len: usize) -> Result<Self> {
        let overflow = || Error::ArenaFull {
            bytes: offset.saturating_add(len),
        };
        let end = offset.checked_add(len).ok_or_else(overflow)?;
        u32::try_from(end).map_err(|_| overflow())?;
        Ok(Self {
            offset: offset as u32,
            len: len as u32,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Append-only storage for distinct key bytes.
#[derive(Debug)]
pub struct NameArena {
    bytes: Vec<u8>,
}

impl NameArena {
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Appends `key`; fails once offsets no longer fit a `KeyRef`.
    #[inline(always)]
    pub fn push(&mut self, key: &[u8]) -> Result<KeyRef> {
        let key_ref = KeyRef::at(self.bytes.len(), key.len())?;
        self.bytes.extend_from_slice(key);
        Ok(key_ref)
    }

    #[inline(always)]
    pub fn get(&self, key: KeyRef) -> &[u8] {
        let start = key.offset as usize;
        &self.bytes[start..start + key.len as usize]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug)]
struct Entry {
    hash: u32,
    key: KeyRef,
    next: u32,
    acc: Accumulator,
}

pub struct AggregatorTable<H> {
    hasher: H,
    buckets: Box<[u32]>,
    entries: Vec<Entry>,
    names: NameArena,
}

impl<H: HashStrategy> AggregatorTable<H> {
    pub fn new(hasher: H, capacity: usize) -> Self {
        assert!(capacity > 0, "table capacity must be positive");
        assert!(capacity < NO_ENTRY as usize, "table capacity too large");
        Self {
            hasher,
            buckets: vec![NO_ENTRY; capacity].into_boxed_slice(),
            entries: Vec::with_capacity(capacity),
            names: NameArena::with_capacity(capacity * MAX_KEY_LEN),
        }
    }

    /// Records one observation of `key`, creating its entry on first sight.
    #[inline(always)]
    pub fn add(&mut self, key: &[u8], value: f64) -> Result<()> {
        let hash = self.hasher.hash(key);
        let bucket = hash as usize % self.buckets.len();

        let mut idx = self.buckets[bucket];
        while idx != NO_ENTRY {
            let entry = &mut self.entries[idx as usize];
            // equal hashes are not enough, two keys may still collide
            if entry.hash == hash && self.names.get(entry.key) == key {
                entry.acc.add(value);
                return Ok(());
            }
            idx = entry.next;
        }

        if self.entries.len() == self.buckets.len() {
            return Err(Error::Capacity {
                capacity: self.buckets.len(),
            });
        }

        let key = self.names.push(key)?;
        self.entries.push(Entry {
            hash,
            key,
            next: self.buckets[bucket],
            acc: Accumulator::new(value),
        });
        self.buckets[bucket] = (self.entries.len() - 1) as u32;
        return Ok(());
    }

    pub fn get(&self, key: &[u8]) -> Option<&Accumulator> {
        let hash = self.hasher.hash(key);
        let mut idx = self.buckets[hash as usize % self.buckets.len()];
        while idx != NO_ENTRY {
            let entry = &self.entries[idx as usize];
            if entry.hash == hash && self.names.get(entry.key) == key {
                return Some(&entry.acc);
            }
            idx = entry.next;
        }
        None
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Accumulator)> + '_ {
        self.entries
            .iter()
            .map(|e| (self.names.get(e.key), &e.acc))
    }
}
