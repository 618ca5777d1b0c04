use crate::config::FeeParameters;
use crate::error::MathError;
use crate::math::math_helpers::mul_div_rounding_up;
use crate::{BASIS_POINT_MAX, MAX_FEE, PRECISION};
use alloy_primitives::U256;

/// Fee charged on top of `amount`, so that `amount + fee` pays exactly
/// `total_fee` of the gross: `ceil(amount * fee / (1e18 - fee))`.
pub fn get_fee_amount(amount: U256, total_fee: u128) -> Result<U256, MathError> {
    let denominator = PRECISION
        .checked_sub(total_fee)
        .filter(|d| *d != 0)
        .ok_or(MathError::Overflow)?;
    mul_div_rounding_up(amount, U256::from(total_fee), U256::from(denominator))
}

/// Fee included in `amount_with_fees`: `ceil(amount * fee / 1e18)`.
pub fn get_fee_amount_from(amount_with_fees: U256, total_fee: u128) -> Result<U256, MathError> {
    mul_div_rounding_up(amount_with_fees, U256::from(total_fee), U256::from(PRECISION))
}

/// Fee model consulted by the swap walk.
///
/// The walk only ever asks for the rate in force and reports bin movement;
/// how the volatility component decays is up to the implementation. The
/// walk clones the strategy and commits the clone only when a swap
/// succeeds.
pub trait FeeStrategy: Clone {
    /// Total fee rate in 1e18 precision.
    fn total_fee(&self, bin_step: u16) -> u128;

    /// Refreshes reference id/volatility at the start of a swap.
    fn update_references(&mut self, active_id: u32, timestamp: u64);

    /// Accounts for the walk having moved to `active_id`.
    fn update_volatility_accumulator(&mut self, active_id: u32);

    fn volatility_accumulator(&self) -> u32;

    fn id_reference(&self) -> u32;

    /// Distance in bins between `active_id` and the reference bin.
    fn delta_id(&self, active_id: u32) -> u32 {
        self.id_reference().abs_diff(active_id)
    }

    /// Fee to add on top of a net `amount` at the current rate.
    fn fee_amount(&self, amount: U256, bin_step: u16) -> Result<U256, MathError> {
        get_fee_amount(amount, self.total_fee(bin_step))
    }

    /// Fee contained in a gross `amount_with_fees` at the current rate.
    fn fee_amount_from(&self, amount_with_fees: U256, bin_step: u16) -> Result<U256, MathError> {
        get_fee_amount_from(amount_with_fees, self.total_fee(bin_step))
    }
}

/// Flat fee with no volatility component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticFee {
    pub fee: u128,
    id_reference: u32,
}

impl StaticFee {
    pub fn new(fee: u128, active_id: u32) -> Self {
        Self {
            fee: fee.min(MAX_FEE),
            id_reference: active_id,
        }
    }
}

impl FeeStrategy for StaticFee {
    fn total_fee(&self, _bin_step: u16) -> u128 {
        self.fee
    }

    fn update_references(&mut self, active_id: u32, _timestamp: u64) {
        self.id_reference = active_id;
    }

    fn update_volatility_accumulator(&mut self, _active_id: u32) {}

    fn volatility_accumulator(&self) -> u32 {
        0
    }

    fn id_reference(&self) -> u32 {
        self.id_reference
    }
}

/// Base fee plus a variable fee driven by a volatility accumulator.
///
/// The accumulator measures how far swaps pushed the active bin away from
/// a reference bin. Swaps closer together than `filter_period` share the
/// same reference; after it the reference moves to the current bin and the
/// carried volatility shrinks by `reduction_factor`, and after
/// `decay_period` it resets to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableFee {
    pub params: FeeParameters,
    volatility_accumulator: u32,
    volatility_reference: u32,
    id_reference: u32,
    time_of_last_update: u64,
}

impl VariableFee {
    pub fn new(params: FeeParameters, active_id: u32) -> Self {
        Self {
            params,
            id_reference: active_id,
            ..Default::default()
        }
    }

    pub fn volatility_reference(&self) -> u32 {
        self.volatility_reference
    }

    pub fn time_of_last_update(&self) -> u64 {
        self.time_of_last_update
    }

    /// `base_factor * bin_step * 1e10`, in 1e18 precision.
    pub fn base_fee(&self, bin_step: u16) -> u128 {
        self.params.base_factor as u128 * bin_step as u128 * 10_000_000_000
    }

    /// `ceil((v * bin_step)^2 * variable_fee_control / 100)`, in 1e18
    /// precision.
    pub fn variable_fee(&self, bin_step: u16) -> u128 {
        if self.params.variable_fee_control == 0 {
            return 0;
        }
        let prod = self.volatility_accumulator as u128 * bin_step as u128;
        prod.saturating_mul(prod)
            .saturating_mul(self.params.variable_fee_control as u128)
            .saturating_add(99)
            / 100
    }
}

impl FeeStrategy for VariableFee {
    fn total_fee(&self, bin_step: u16) -> u128 {
        self.base_fee(bin_step)
            .saturating_add(self.variable_fee(bin_step))
            .min(MAX_FEE)
    }

    fn update_references(&mut self, active_id: u32, timestamp: u64) {
        let dt = timestamp.saturating_sub(self.time_of_last_update);
        if dt >= self.params.filter_period as u64 {
            self.id_reference = active_id;
            self.volatility_reference = if dt < self.params.decay_period as u64 {
                (self.volatility_accumulator as u64 * self.params.reduction_factor as u64
                    / BASIS_POINT_MAX as u64) as u32
            } else {
                0
            };
        }
        self.time_of_last_update = timestamp;
    }

    fn update_volatility_accumulator(&mut self, active_id: u32) {
        let accumulator = self.volatility_reference as u64
            + self.delta_id(active_id) as u64 * BASIS_POINT_MAX as u64;
        self.volatility_accumulator =
            accumulator.min(self.params.max_volatility_accumulator as u64) as u32;
    }

    fn volatility_accumulator(&self) -> u32 {
        self.volatility_accumulator
    }

    fn id_reference(&self) -> u32 {
        self.id_reference
    }
}
