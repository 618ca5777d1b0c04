use crate::error::{MathError, StateError};
use crate::math::math_helpers::mul_div;
use crate::{FastMap, SCALE};
use alloy_primitives::U256;

/// Reserves and fee accumulators of a single price bin.
///
/// `total_supply` is the number of liquidity shares outstanding; it is
/// written by the host's mint/burn layer and only read here, to spread
/// swap fees per share.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bin {
    pub reserve_x: U256,
    pub reserve_y: U256,
    pub total_supply: U256,
    /// Fees in token X earned per share, 128.128.
    pub fee_growth_x: U256,
    /// Fees in token Y earned per share, 128.128.
    pub fee_growth_y: U256,
}

impl Bin {
    pub fn new(reserve_x: U256, reserve_y: U256) -> Self {
        Self {
            reserve_x,
            reserve_y,
            ..Default::default()
        }
    }

    /// A bin with both reserves at zero holds no liquidity and must not be
    /// in the bin index.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reserve_x.is_zero() && self.reserve_y.is_zero()
    }

    /// Reserve paid out by a swap in the given direction.
    #[inline]
    pub fn reserve_out(&self, swap_for_y: bool) -> U256 {
        if swap_for_y {
            self.reserve_y
        } else {
            self.reserve_x
        }
    }

    /// Books one swap step: `amount_in_with_fees` enters the input side,
    /// `amount_out` leaves the output side.
    ///
    /// The fee goes to the input token's fee accumulator, or into the input
    /// reserve when the bin has no recorded shares to credit.
    pub fn apply_swap(
        &mut self,
        swap_for_y: bool,
        amount_in_with_fees: U256,
        amount_out: U256,
        fee: U256,
    ) -> Result<(), crate::error::Error> {
        let amount_in = amount_in_with_fees
            .checked_sub(fee)
            .ok_or(MathError::Underflow)?;

        let (reserve_in, reserve_out, fee_growth_in) = if swap_for_y {
            (&mut self.reserve_x, &mut self.reserve_y, &mut self.fee_growth_x)
        } else {
            (&mut self.reserve_y, &mut self.reserve_x, &mut self.fee_growth_y)
        };

        let new_out = reserve_out
            .checked_sub(amount_out)
            .ok_or(StateError::InsufficientReserves)?;

        let (credited_in, growth) = if self.total_supply.is_zero() || fee.is_zero() {
            (amount_in.checked_add(fee).ok_or(MathError::Overflow)?, *fee_growth_in)
        } else {
            let per_share = mul_div(fee, SCALE, self.total_supply)?;
            (
                amount_in,
                fee_growth_in.checked_add(per_share).ok_or(MathError::Overflow)?,
            )
        };

        let new_in = reserve_in
            .checked_add(credited_in)
            .ok_or(MathError::Overflow)?;

        *reserve_in = new_in;
        *reserve_out = new_out;
        *fee_growth_in = growth;
        Ok(())
    }
}

/// Key‑addressed bin storage owned by the host.
///
/// Reads of a bin that was never written return an empty bin.
pub trait BinStore {
    fn get_bin(&self, id: u32) -> Bin;
    fn set_bin(&mut self, id: u32, bin: Bin);
}

impl BinStore for FastMap<u32, Bin> {
    fn get_bin(&self, id: u32) -> Bin {
        self.get(&id).copied().unwrap_or_default()
    }

    fn set_bin(&mut self, id: u32, bin: Bin) {
        self.insert(id, bin);
    }
}
