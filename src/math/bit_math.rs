use crate::error::MathError;
use alloy_primitives::U256;

const MASK_128: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);
const MASK_64: U256 = U256::from_limbs([u64::MAX, 0, 0, 0]);
const MASK_32: U256 = U256::from_limbs([u32::MAX as u64, 0, 0, 0]);
const MASK_16: U256 = U256::from_limbs([u16::MAX as u64, 0, 0, 0]);
const MASK_8: U256 = U256::from_limbs([u8::MAX as u64, 0, 0, 0]);
const MASK_4: U256 = U256::from_limbs([0xf, 0, 0, 0]);
const MASK_2: U256 = U256::from_limbs([0x3, 0, 0, 0]);

/// Side of a bit (or bin) to search on.
///
/// `Lower` walks toward bit 0 / smaller bin ids (a swap of X for Y),
/// `Higher` toward bit 255 / larger bin ids (a swap of Y for X).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Lower,
    Higher,
}

impl Direction {
    /// Direction the active bin moves in for a swap.
    #[inline]
    pub fn for_swap(swap_for_y: bool) -> Self {
        if swap_for_y {
            Direction::Lower
        } else {
            Direction::Higher
        }
    }
}

/// Returns the index (0–255) of the most significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
///
/// Binary search over the thresholds 128, 64, ..., 1: every step halves the
/// window that can still hold the top bit, so the answer takes 8 compares.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }

    let mut r = x;
    let mut msb: u8 = 0;

    if r > MASK_128 {
        msb |= 128;
        r >>= 128;
    }
    if r > MASK_64 {
        msb |= 64;
        r >>= 64;
    }
    if r > MASK_32 {
        msb |= 32;
        r >>= 32;
    }
    if r > MASK_16 {
        msb |= 16;
        r >>= 16;
    }
    if r > MASK_8 {
        msb |= 8;
        r >>= 8;
    }
    if r > MASK_4 {
        msb |= 4;
        r >>= 4;
    }
    if r > MASK_2 {
        msb |= 2;
        r >>= 2;
    }
    if r > U256::ONE {
        msb |= 1;
    }

    Ok(msb)
}

/// Returns the index (0–255) of the least significant set bit in a `U256`,
/// or `MathError::ZeroValue` if the input is zero.
///
/// Mirror of [`most_significant_bit`]: a masked half that is empty means
/// the lowest bit sits above it, so shift it out and record the offset.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }

    let mut r = x;
    let mut lsb: u8 = 0;

    if (r & MASK_128).is_zero() {
        lsb |= 128;
        r >>= 128;
    }
    if (r & MASK_64).is_zero() {
        lsb |= 64;
        r >>= 64;
    }
    if (r & MASK_32).is_zero() {
        lsb |= 32;
        r >>= 32;
    }
    if (r & MASK_16).is_zero() {
        lsb |= 16;
        r >>= 16;
    }
    if (r & MASK_8).is_zero() {
        lsb |= 8;
        r >>= 8;
    }
    if (r & MASK_4).is_zero() {
        lsb |= 4;
        r >>= 4;
    }
    if (r & MASK_2).is_zero() {
        lsb |= 2;
        r >>= 2;
    }
    if (r & U256::ONE).is_zero() {
        lsb |= 1;
    }

    Ok(lsb)
}

/// Finds the set bit of `word` closest to `from_bit`, looking only at bits
/// strictly beyond it in `direction`. `from_bit` itself is never returned.
///
/// The word is shifted so that `from_bit` and everything on the other side
/// fall off; what remains is scanned with MSB (lower side) or LSB
/// (higher side) and the shift is added back.
pub fn closest_bit(word: U256, from_bit: u8, direction: Direction) -> Option<u8> {
    match direction {
        Direction::Lower => {
            if from_bit == 0 {
                return None;
            }
            let shift = 256 - from_bit as usize;
            let shifted = word << shift;
            most_significant_bit(shifted)
                .ok()
                .map(|msb| msb - shift as u8)
        }
        Direction::Higher => {
            if from_bit == u8::MAX {
                return None;
            }
            let shift = from_bit as usize + 1;
            let shifted = word >> shift;
            least_significant_bit(shifted)
                .ok()
                .map(|lsb| lsb + shift as u8)
        }
    }
}
