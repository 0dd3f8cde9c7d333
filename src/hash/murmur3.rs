use super::{HashStrategy, read_u32_le};

const C1: u32 = 0xcc9e2d51;
const C2: u32 = 0x1b873593;

/// MurmurHash3, x86 32-bit variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3 {
    seed: u32,
}

impl Murmur3 {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

#[inline(always)]
fn scramble(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

impl HashStrategy for Murmur3 {
    #[inline(always)]
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut h = self.seed;

        let blocks = bytes.len() / 4;
        for i in 0..blocks {
            h ^= scramble(read_u32_le(bytes, i * 4));
            h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe6546b64);
        }

        // tail: last byte ends up in the most significant position
        let mut k: u32 = 0;
        for &c in bytes[blocks * 4..].iter().rev() {
            k = (k << 8) | c as u32;
        }
        h ^= scramble(k);

        h ^= bytes.len() as u32;
        h ^= h >> 16;
        h = h.wrapping_mul(0x85ebca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2ae35);
        h ^= h >> 16;
        return h;
    }

    fn name(&self) -> &'static str {
        "murmur3"
    }
}
