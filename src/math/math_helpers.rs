use crate::error::MathError;
use alloy_primitives::U256;

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

#[cold]
fn cold() {}

#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold()
    }
    b
}

/// Returns the 512‑bit product `x * y` as `(prod0, prod1)`, the low and
/// high 256‑bit words.
///
/// `x * y mod (2^256 - 1)` and `x * y mod 2^256` differ exactly by the
/// high word (Chinese remainder), so no native double‑width type is needed.
#[inline(always)]
fn get_mul_prods(x: U256, y: U256) -> (U256, U256) {
    let mm = x.mul_mod(y, U256::MAX);
    let prod0 = x.wrapping_mul(y);

    let (mut prod1, borrow) = mm.overflowing_sub(prod0);
    if borrow {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }
    (prod0, prod1)
}

/// Finishes a round‑down division of the 512‑bit value `(prod0, prod1)` by
/// `denominator`, where `remainder` is `(prod0, prod1) mod denominator`.
///
/// Requires `prod1 < denominator`, otherwise the quotient needs more than
/// 256 bits and `MathError::Overflow` is returned.
#[inline(always)]
fn get_end_of_div_round_down(
    remainder: U256,
    mut denominator: U256,
    mut prod0: U256,
    mut prod1: U256,
) -> Result<U256, MathError> {
    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    if unlikely(denominator <= prod1) {
        return Err(MathError::Overflow);
    }

    // Make the division exact.
    let (prod0_new, borrow) = prod0.overflowing_sub(remainder);
    prod0 = prod0_new;
    if borrow {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    // Strip the power of two out of the denominator and shift it out of the
    // numerator, pulling the matching bits down from the high word.
    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let flip = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256::ONE);
    prod0 |= prod1.wrapping_mul(flip);

    // The denominator is now odd and invertible mod 2^256. The seed is
    // correct to 4 bits; each Newton–Raphson step doubles that, so six
    // steps reach 256.
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;

    macro_rules! newton_iteration {
        () => {
            inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)))
        };
    }

    newton_iteration!(); // 8 bits
    newton_iteration!(); // 16
    newton_iteration!(); // 32
    newton_iteration!(); // 64
    newton_iteration!(); // 128
    newton_iteration!(); // 256

    Ok(prod0.wrapping_mul(inv))
}

#[inline(always)]
fn add_one_if(result: U256, round_up: bool) -> Result<U256, MathError> {
    if round_up {
        result.checked_add(U256::ONE).ok_or(MathError::Overflow)
    } else {
        Ok(result)
    }
}

/// Computes `floor(a * b / denominator)` with full 512‑bit intermediate
/// precision, returning a `MathError` on overflow or division by zero.
///
/// This underpins every amount and fee calculation of the swap walk.
#[inline(always)]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if unlikely(denominator.is_zero()) {
        return Err(MathError::DivisionByZero);
    }

    let (prod0, prod1) = get_mul_prods(a, b);
    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }
    let remainder = a.mul_mod(b, denominator);
    get_end_of_div_round_down(remainder, denominator, prod0, prod1)
}

/// Like [`mul_div`], but rounds the result up when there is a
/// non‑zero remainder, returning an overflow error if the result
/// would exceed `U256::MAX`.
#[inline(always)]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;
    add_one_if(result, !a.mul_mod(b, denominator).is_zero())
}

/// Computes `floor(x * y / 2^offset)` without truncating the 512‑bit
/// product.
///
/// Used to apply a 128.128 price to an amount (`offset = 128`).
pub fn mul_shift_round_down(x: U256, y: U256, offset: u8) -> Result<U256, MathError> {
    let (prod0, prod1) = get_mul_prods(x, y);
    if offset == 0 {
        return if prod1.is_zero() {
            Ok(prod0)
        } else {
            Err(MathError::Overflow)
        };
    }

    let offset = offset as usize;
    let mut result = prod0 >> offset;
    if !prod1.is_zero() {
        if prod1 >= (U256::ONE << offset) {
            return Err(MathError::Overflow);
        }
        result |= prod1 << (256 - offset);
    }
    Ok(result)
}

/// Like [`mul_shift_round_down`], rounding up when any shifted‑out bit
/// was set.
pub fn mul_shift_round_up(x: U256, y: U256, offset: u8) -> Result<U256, MathError> {
    let result = mul_shift_round_down(x, y, offset)?;
    let discarded = if offset == 0 {
        U256::ZERO
    } else {
        x.mul_mod(y, U256::ONE << offset as usize)
    };
    add_one_if(result, !discarded.is_zero())
}

/// Computes `floor(x * 2^offset / denominator)` with full precision.
///
/// Used to divide an amount by a 128.128 price (`offset = 128`).
pub fn shift_div_round_down(x: U256, offset: u8, denominator: U256) -> Result<U256, MathError> {
    if unlikely(denominator.is_zero()) {
        return Err(MathError::DivisionByZero);
    }
    if offset == 0 {
        return Ok(x.wrapping_div(denominator));
    }

    let offset = offset as usize;
    let prod0 = x << offset;
    let prod1 = x >> (256 - offset);
    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }
    let remainder = x.mul_mod(U256::ONE << offset, denominator);
    get_end_of_div_round_down(remainder, denominator, prod0, prod1)
}

/// Like [`shift_div_round_down`], rounding up on a non‑zero remainder.
pub fn shift_div_round_up(x: U256, offset: u8, denominator: U256) -> Result<U256, MathError> {
    let result = shift_div_round_down(x, offset, denominator)?;
    let remainder = x.mul_mod(U256::ONE << offset as usize, denominator);
    add_one_if(result, !remainder.is_zero())
}
