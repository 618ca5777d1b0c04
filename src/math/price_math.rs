use crate::error::{Error, MathError, StateError};
use crate::{BASIS_POINT_MAX, ID_MID, MAX_BIN_ID, SCALE, SCALE_OFFSET};
use alloy_primitives::U256;

/// Exponents at or beyond this bound are rejected by [`pow`]: the
/// square‑and‑multiply below only looks at 20 bits.
const MAX_ABS_EXPONENT: u32 = 0x100000;

/// Returns `1 + bin_step / 10_000` as a 128.128 fixed‑point number.
///
/// `bin_step` must be in `1..=10_000`.
pub fn get_base(bin_step: u16) -> Result<U256, StateError> {
    if bin_step == 0 || bin_step > BASIS_POINT_MAX {
        return Err(StateError::InvalidBinStep);
    }
    Ok(SCALE + (U256::from(bin_step) << SCALE_OFFSET as usize) / U256::from(BASIS_POINT_MAX))
}

/// Returns the signed distance of `id` from the mid bin.
#[inline]
pub fn get_exponent(id: u32) -> i32 {
    id as i32 - ID_MID as i32
}

/// Raises a 128.128 number to a signed integer power.
///
/// Square‑and‑multiply over the low 20 bits of `|y|`. Squaring a base
/// above 1.0 would leave the 256‑bit word, so such a base is replaced by its
/// reciprocal and the final result inverted instead, since
/// `x^y = (1/x)^(-y)`. A zero intermediate result means the true value is
/// below the 128.128 resolution: `MathError::Underflow` is returned and the
/// value is never clamped.
pub fn pow(x: U256, y: i32) -> Result<U256, MathError> {
    if y == 0 {
        return Ok(SCALE);
    }

    let mut invert = y < 0;
    let abs_y = y.unsigned_abs();

    let mut result = U256::ZERO;

    if abs_y < MAX_ABS_EXPONENT {
        result = SCALE;

        let mut squared = x;
        if x > U256::from(u128::MAX) {
            squared = U256::MAX / squared;
            invert = !invert;
        }

        let mut bit = 1u32;
        while bit < MAX_ABS_EXPONENT {
            if abs_y & bit != 0 {
                result = result.wrapping_mul(squared) >> SCALE_OFFSET as usize;
            }
            squared = squared.wrapping_mul(squared) >> SCALE_OFFSET as usize;
            bit <<= 1;
        }
    }

    if result.is_zero() {
        return Err(MathError::Underflow);
    }

    Ok(if invert { U256::MAX / result } else { result })
}

/// Returns the 128.128 price of bin `id` for a pair with `bin_step`.
///
/// The price is a pure function of `(id, bin_step)` and is recomputed on
/// every use, so it can never drift from the curve. `get_price_from_id(ID_MID,
/// step)` is exactly `SCALE` (1.0).
pub fn get_price_from_id(id: u32, bin_step: u16) -> Result<U256, Error> {
    if id > MAX_BIN_ID {
        return Err(StateError::BinIdOutOfBounds.into());
    }
    let base = get_base(bin_step)?;
    Ok(pow(base, get_exponent(id))?)
}

/// Converts a 128.128 price into an `f64` for display and logging.
///
/// Lossy; never feed the result back into swap math.
pub fn price_to_f64(price: U256) -> f64 {
    let raw = price
        .as_limbs()
        .iter()
        .rev()
        .fold(0f64, |acc, limb| acc * 2f64.powi(64) + *limb as f64);
    raw / 2f64.powi(SCALE_OFFSET as i32)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_base_bounds() {
        assert!(matches!(get_base(0), Err(StateError::InvalidBinStep)));
        assert!(matches!(get_base(10_001), Err(StateError::InvalidBinStep)));
        assert_eq!(get_base(10_000).unwrap(), SCALE * U256::from(2u8));
    }

    #[test]
    fn test_get_base_value() {
        let expected = SCALE + (U256::from(25u8) << 128usize) / U256::from(10_000u16);
        assert_eq!(get_base(25).unwrap(), expected);
        assert_eq!(get_base(25).unwrap() >> 128usize, U256::ONE);
    }

    #[test]
    fn test_mid_price_is_exactly_one() {
        for step in [1u16, 10, 25, 100, 10_000] {
            assert_eq!(get_price_from_id(ID_MID, step).unwrap(), SCALE);
        }
    }

    #[test]
    fn test_pow_small_exponents() {
        let two = SCALE * U256::from(2u8);
        let close = |value: U256, expected: f64| {
            ((price_to_f64(value) - expected) / expected).abs() < 1e-12
        };
        assert!(close(pow(two, 1).unwrap(), 2.0));
        assert!(close(pow(two, 10).unwrap(), 1024.0));
        // 2^-1 never leaves the reciprocal branch: MAX / 2^129 is one unit short of 0.5
        let half = pow(two, -1).unwrap();
        assert_eq!(half, (SCALE >> 1usize) - U256::ONE);
    }

    #[test]
    fn test_pow_zero_exponent_is_one() {
        assert_eq!(pow(get_base(25).unwrap(), 0).unwrap(), SCALE);
        assert_eq!(pow(U256::ZERO, 0).unwrap(), SCALE);
    }

    #[test]
    fn test_pow_exponent_out_of_range() {
        let base = get_base(1).unwrap();
        assert!(matches!(pow(base, 0x100000), Err(MathError::Underflow)));
        assert!(matches!(pow(base, -0x100000), Err(MathError::Underflow)));
    }

    #[test]
    fn test_pow_underflow_is_reported() {
        // (1/2)^200 is below 2^-128
        let half = SCALE >> 1usize;
        assert!(matches!(pow(half, 200), Err(MathError::Underflow)));
    }

    #[test]
    fn test_adjacent_bins_differ_by_one_step() {
        let step = 25u16;
        let p0 = price_to_f64(get_price_from_id(ID_MID, step).unwrap());
        let p1 = price_to_f64(get_price_from_id(ID_MID + 1, step).unwrap());
        let pm1 = price_to_f64(get_price_from_id(ID_MID - 1, step).unwrap());
        assert!((p1 / p0 - 1.0025).abs() < 1e-12);
        assert!((p0 / pm1 - 1.0025).abs() < 1e-12);
    }

    #[test]
    fn test_price_matches_float_curve() {
        let step = 100u16;
        for delta in [-5000i32, -700, -1, 1, 333, 5000] {
            let id = (ID_MID as i32 + delta) as u32;
            let price = price_to_f64(get_price_from_id(id, step).unwrap());
            let expected = 1.01f64.powi(delta);
            assert!(
                ((price - expected) / expected).abs() < 1e-9,
                "id {id}: {price} vs {expected}"
            );
        }
    }

    #[test]
    fn test_price_strictly_increasing() {
        for step in [1u16, 25, 100] {
            let mut previous = get_price_from_id(ID_MID - 2_000, step).unwrap();
            for id in (ID_MID - 1_999)..=(ID_MID + 2_000) {
                let price = get_price_from_id(id, step).unwrap();
                assert!(price > previous, "step {step} id {id}");
                previous = price;
            }
        }
    }

    #[test]
    fn test_price_rejects_bad_inputs() {
        assert!(matches!(
            get_price_from_id(MAX_BIN_ID + 1, 25),
            Err(Error::StateError(StateError::BinIdOutOfBounds))
        ));
        assert!(matches!(
            get_price_from_id(ID_MID, 0),
            Err(Error::StateError(StateError::InvalidBinStep))
        ));
    }

    #[test]
    fn test_extreme_ids_underflow_instead_of_clamping() {
        // 1.01^-(2^20) is far below 2^-128
        let id = ID_MID - 0x0f_ffff;
        assert!(matches!(
            get_price_from_id(id, 100),
            Err(Error::MathError(MathError::Underflow))
        ));
    }
}
