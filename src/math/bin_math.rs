use crate::error::MathError;
use crate::math::fee_math::FeeStrategy;
use crate::math::math_helpers::{
    mul_shift_round_down, mul_shift_round_up, shift_div_round_down, shift_div_round_up,
};
use crate::pool::bin::Bin;
use crate::SCALE_OFFSET;
use alloy_primitives::U256;

/// Amounts of one swap step inside a single bin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinSwapAmounts {
    /// Input taken from the trader, fee included.
    pub amount_in_with_fees: U256,
    /// Output paid out of the bin's reserve.
    pub amount_out: U256,
    /// Part of `amount_in_with_fees` charged as fee.
    pub fee: U256,
}

/// Input (before fees) that exactly buys `amount_out` at `price`, rounded up.
///
/// Swapping for Y the input is X: `ceil(amount_out / price)`; swapping for
/// X the input is Y: `ceil(amount_out * price)`.
#[inline]
pub fn amount_in_for(amount_out: U256, price: U256, swap_for_y: bool) -> Result<U256, MathError> {
    if swap_for_y {
        shift_div_round_up(amount_out, SCALE_OFFSET, price)
    } else {
        mul_shift_round_up(amount_out, price, SCALE_OFFSET)
    }
}

/// Output bought by a net `amount_in` at `price`, rounded down.
#[inline]
pub fn amount_out_for(amount_in: U256, price: U256, swap_for_y: bool) -> Result<U256, MathError> {
    if swap_for_y {
        mul_shift_round_down(amount_in, price, SCALE_OFFSET)
    } else {
        shift_div_round_down(amount_in, SCALE_OFFSET, price)
    }
}

/// Computes how much of `amount_in_left` the bin absorbs and what it pays
/// out, for an exact‑input swap.
///
/// If the remaining input covers the bin's whole output reserve plus fee
/// the bin is drained. Otherwise the fee is taken out of the remaining input
/// and the rest is priced, with the output clamped to the reserve; the
/// whole remaining input is consumed.
pub fn get_amounts<F: FeeStrategy>(
    bin: &Bin,
    price: U256,
    bin_step: u16,
    swap_for_y: bool,
    amount_in_left: U256,
    fee: &F,
) -> Result<BinSwapAmounts, MathError> {
    let reserve_out = bin.reserve_out(swap_for_y);

    let max_amount_in = amount_in_for(reserve_out, price, swap_for_y)?;
    let max_fee = fee.fee_amount(max_amount_in, bin_step)?;
    let max_amount_in_with_fees = max_amount_in
        .checked_add(max_fee)
        .ok_or(MathError::Overflow)?;

    if amount_in_left >= max_amount_in_with_fees {
        return Ok(BinSwapAmounts {
            amount_in_with_fees: max_amount_in_with_fees,
            amount_out: reserve_out,
            fee: max_fee,
        });
    }

    let fee_amount = fee.fee_amount_from(amount_in_left, bin_step)?;
    let amount_in = amount_in_left
        .checked_sub(fee_amount)
        .ok_or(MathError::Underflow)?;
    let amount_out = amount_out_for(amount_in, price, swap_for_y)?.min(reserve_out);

    Ok(BinSwapAmounts {
        amount_in_with_fees: amount_in_left,
        amount_out,
        fee: fee_amount,
    })
}

/// Exact‑output mirror of [`get_amounts`]: pays out
/// `min(amount_out_left, reserve)` and charges the rounded‑up input plus the
/// fee on top of it.
pub fn get_amount_in<F: FeeStrategy>(
    bin: &Bin,
    price: U256,
    bin_step: u16,
    swap_for_y: bool,
    amount_out_left: U256,
    fee: &F,
) -> Result<BinSwapAmounts, MathError> {
    let amount_out = bin.reserve_out(swap_for_y).min(amount_out_left);

    let amount_in = amount_in_for(amount_out, price, swap_for_y)?;
    let fee_amount = fee.fee_amount(amount_in, bin_step)?;

    Ok(BinSwapAmounts {
        amount_in_with_fees: amount_in
            .checked_add(fee_amount)
            .ok_or(MathError::Overflow)?,
        amount_out,
        fee: fee_amount,
    })
}
