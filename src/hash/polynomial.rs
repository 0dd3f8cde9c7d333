use super::HashStrategy;

// 31^2, 31^3, 31^4
const P2: u32 = 31 * 31;
const P3: u32 = 31 * 31 * 31;
const P4: u32 = 31 * 31 * 31 * 31;

/// The classic `h = 31 * h + byte`, fed 4 bytes per step.
///
/// Fast but poorly distributed; kept as the naive baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Polynomial;

impl HashStrategy for Polynomial {
    #[inline(always)]
    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut h: u32 = 0;
        let mut blocks = bytes.chunks_exact(4);
        for b in &mut blocks {
            h = h
                .wrapping_mul(P4)
                .wrapping_add((b[0] as u32).wrapping_mul(P3))
                .wrapping_add((b[1] as u32).wrapping_mul(P2))
                .wrapping_add((b[2] as u32).wrapping_mul(31))
                .wrapping_add(b[3] as u32);
        }
        for &c in blocks.remainder() {
            h = h.wrapping_mul(31).wrapping_add(c as u32);
        }
        return h;
    }

    fn name(&self) -> &'static str {
        "polynomial"
    }
}

/// One byte at a time; the unrolled version must always agree with this.
pub fn polynomial_naive(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |h, &c| h.wrapping_mul(31).wrapping_add(c as u32))
}
