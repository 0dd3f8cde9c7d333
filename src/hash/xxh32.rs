use super::{HashStrategy, read_u32_le};

const PRIME1: u32 = 0x9E3779B1;
const PRIME2: u32 = 0x85EBCA77;
const PRIME3: u32 = 0xC2B2AE3D;
const PRIME4: u32 = 0x27D4EB2F;
const PRIME5: u32 = 0x165667B1;

const STRIPE: usize = 16;

#[inline(always)]
fn round(acc: u32, input: u32) -> u32 {
    acc.wrapping_add(input.wrapping_mul(PRIME2))
        .rotate_left(13)
        .wrapping_mul(PRIME1)
}

#[inline(always)]
fn initial_state(seed: u32) -> [u32; 4] {
    [
        seed.wrapping_add(PRIME1).wrapping_add(PRIME2),
        seed.wrapping_add(PRIME2),
        seed,
        seed.wrapping_sub(PRIME1),
    ]
}

#[inline(always)]
fn process_stripe(state: &mut [u32; 4], stripe: &[u8]) {
    state[0] = round(state[0], read_u32_le(stripe, 0));
    state[1] = round(state[1], read_u32_le(stripe, 4));
    state[2] = round(state[2], read_u32_le(stripe, 8));
    state[3] = round(state[3], read_u32_le(stripe, 12));
}

#[inline(always)]
fn converge(state: &[u32; 4]) -> u32 {
    state[0]
        .rotate_left(1)
        .wrapping_add(state[1].rotate_left(7))
        .wrapping_add(state[2].rotate_left(12))
        .wrapping_add(state[3].rotate_left(18))
}

/// Folds the last 0..16 bytes into `h` and applies the avalanche.
#[inline(always)]
fn finalize(mut h: u32, tail: &[u8]) -> u32 {
    let mut words = tail.chunks_exact(4);
    for w in &mut words {
        h = h
            .wrapping_add(read_u32_le(w, 0).wrapping_mul(PRIME3))
            .rotate_left(17)
            .wrapping_mul(PRIME4);
    }
    for &c in words.remainder() {
        h = h
            .wrapping_add((c as u32).wrapping_mul(PRIME5))
            .rotate_left(11)
            .wrapping_mul(PRIME1);
    }

    h ^= h >> 15;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 13;
    h = h.wrapping_mul(PRIME3);
    h ^= h >> 16;
    return h;
}

/// One-shot xxHash32.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHash32 {
    seed: u32,
}

impl XxHash32 {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl HashStrategy for XxHash32 {
    #[inline(always)]
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut stripes = bytes.chunks_exact(STRIPE);

        let h = if bytes.len() >= STRIPE {
            let mut state = initial_state(self.seed);
            for stripe in &mut stripes {
                process_stripe(&mut state, stripe);
            }
            converge(&state)
        } else {
            self.seed.wrapping_add(PRIME5)
        };

        finalize(h.wrapping_add(bytes.len() as u32), stripes.remainder())
    }

    fn name(&self) -> &'static str {
        "xxhash32"
    }
}

/// Streaming xxHash32: `reset`, any number of `update` calls, then `finish`.
///
/// Produces the same value as [`XxHash32`] over the concatenated input.
#[derive(Debug, Clone)]
pub struct XxHash32Stream {
    seed: u32,
    state: [u32; 4],
    buf: [u8; STRIPE],
    buf_len: usize,
    total_len: u32,
    stripes_seen: bool,
}

impl XxHash32Stream {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            state: initial_state(seed),
            buf: [0; STRIPE],
            buf_len: 0,
            total_len: 0,
            stripes_seen: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = initial_state(self.seed);
        self.buf_len = 0;
        self.total_len = 0;
        self.stripes_seen = false;
    }

    pub fn update(&mut self, mut input: &[u8]) {
        if input.is_empty() {
            return;
        }
        // the length only matters mod 2^32
        self.total_len = self.total_len.wrapping_add(input.len() as u32);

        if self.buf_len + input.len() < STRIPE {
            self.buf[self.buf_len..self.buf_len + input.len()].copy_from_slice(input);
            self.buf_len += input.len();
            return;
        }

        // complete the carried stripe first
        if self.buf_len > 0 {
            let fill = STRIPE - self.buf_len;
            self.buf[self.buf_len..].copy_from_slice(&input[..fill]);
            process_stripe(&mut self.state, &self.buf);
            self.stripes_seen = true;
            input = &input[fill..];
            self.buf_len = 0;
        }

        let mut stripes = input.chunks_exact(STRIPE);
        for stripe in &mut stripes {
            process_stripe(&mut self.state, stripe);
            self.stripes_seen = true;
        }

        let rest = stripes.remainder();
        self.buf[..rest.len()].copy_from_slice(rest);
        self.buf_len = rest.len();
    }

    pub fn finish(&self) -> u32 {
        let h = if self.stripes_seen {
            converge(&self.state)
        } else {
            self.state[2].wrapping_add(PRIME5)
        };
        finalize(h.wrapping_add(self.total_len), &self.buf[..self.buf_len])
    }
}

impl Default for XxHash32Stream {
    fn default() -> Self {
        Self::new(0)
    }
}
