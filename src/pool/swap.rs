use crate::error::{Error, MathError, SwapError};
use crate::math::bin_math::{get_amount_in, get_amounts, BinSwapAmounts};
use crate::math::bit_math::Direction;
use crate::math::fee_math::FeeStrategy;
use crate::math::math_helpers::unlikely;
use crate::math::price_math::get_price_from_id;
use crate::pool::bin::{Bin, BinStore};
use crate::pool::lb_pair::LbPair;
use crate::FastMap;
use alloy_primitives::U256;
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapResult {
    /// Input taken from the trader, fees included.
    pub amount_in: U256,
    pub amount_out: U256,
    /// Part of `amount_in` charged as fees.
    pub fees_paid: U256,
    /// Bins between the starting and the final active bin.
    pub bins_crossed: u32,
    /// Active bin after the swap.
    pub active_id: u32,
}

/// Which side of the trade the caller fixed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SwapKind {
    ExactInput,
    ExactOutput,
}

// the walk's working copy, written back to the pair only once the walk succeeded
struct SwapState<F> {
    // the amount remaining to be swapped in (exact input) or out (exact output)
    amount_left: U256,
    // input taken so far, fees included
    amount_in: U256,
    // output paid so far
    amount_out: U256,
    // accumulated swap fees
    fees: U256,
    // bin the walk is at
    active_id: u32,
    // bins that took part in a step, with their post-step state
    touched: FastMap<u32, Bin>,
    // fee state as the walk left it
    fee: F,
}

impl<F: FeeStrategy> SwapState<F> {
    fn book(&mut self, kind: SwapKind, step: &BinSwapAmounts) -> Result<(), MathError> {
        let consumed = match kind {
            SwapKind::ExactInput => step.amount_in_with_fees,
            SwapKind::ExactOutput => step.amount_out,
        };
        self.amount_left = self
            .amount_left
            .checked_sub(consumed)
            .ok_or(MathError::Underflow)?;
        self.amount_in = self
            .amount_in
            .checked_add(step.amount_in_with_fees)
            .ok_or(MathError::Overflow)?;
        self.amount_out = self
            .amount_out
            .checked_add(step.amount_out)
            .ok_or(MathError::Overflow)?;
        self.fees = self.fees.checked_add(step.fee).ok_or(MathError::Overflow)?;
        Ok(())
    }
}

impl<F: FeeStrategy, S: BinStore> LbPair<F, S> {
    /// Output and fees of swapping exactly `amount_in` at `timestamp`,
    /// without touching the pair.
    pub fn quote_given_input(
        &self,
        amount_in: U256,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<(U256, U256), Error> {
        let state = self.walk(SwapKind::ExactInput, amount_in, swap_for_y, timestamp)?;
        Ok((state.amount_out, state.fees))
    }

    /// Input (fees included) and fees needed to receive exactly
    /// `amount_out` at `timestamp`, without touching the pair.
    pub fn quote_given_output(
        &self,
        amount_out: U256,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<(U256, U256), Error> {
        let state = self.walk(SwapKind::ExactOutput, amount_out, swap_for_y, timestamp)?;
        Ok((state.amount_in, state.fees))
    }

    /// Swaps exactly `amount_in` and commits the result.
    ///
    /// `swap_for_y` sells X for Y and walks toward lower bin ids; otherwise
    /// Y is sold for X walking up. On error the pair is left untouched.
    pub fn execute(
        &mut self,
        amount_in: U256,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<SwapResult, Error> {
        let state = self.walk(SwapKind::ExactInput, amount_in, swap_for_y, timestamp)?;
        self.commit(state, swap_for_y, timestamp)
    }

    /// Swaps for exactly `amount_out` and commits the result.
    pub fn execute_exact_output(
        &mut self,
        amount_out: U256,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<SwapResult, Error> {
        let state = self.walk(SwapKind::ExactOutput, amount_out, swap_for_y, timestamp)?;
        self.commit(state, swap_for_y, timestamp)
    }

    /// Walks bins from the active one until the fixed amount is filled.
    ///
    /// Bins with nothing to pay out are skipped through the bitmap. Each
    /// bin that does pay out first moves the fee's volatility accumulator to
    /// its distance from the reference bin, then prices its step at its own
    /// price. Nothing here writes to `self`.
    fn walk(
        &self,
        kind: SwapKind,
        amount: U256,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<SwapState<F>, Error> {
        if unlikely(amount.is_zero()) {
            return Err(Error::SwapError(SwapError::ZeroAmount));
        }

        let mut fee = self.fee.clone();
        fee.update_references(self.active_id, timestamp);

        let mut state = SwapState {
            amount_left: amount,
            amount_in: U256::ZERO,
            amount_out: U256::ZERO,
            fees: U256::ZERO,
            active_id: self.active_id,
            touched: FastMap::default(),
            fee,
        };

        let direction = Direction::for_swap(swap_for_y);
        let mut visited = 0u32;

        loop {
            visited += 1;
            if unlikely(visited > self.max_bins_per_swap) {
                return Err(Error::SwapError(SwapError::StepBudgetExhausted));
            }

            let id = state.active_id;
            let mut bin = self.bins.get_bin(id);

            if !bin.reserve_out(swap_for_y).is_zero() {
                state.fee.update_volatility_accumulator(id);

                let price = get_price_from_id(id, self.bin_step)?;
                let step = match kind {
                    SwapKind::ExactInput => get_amounts(
                        &bin,
                        price,
                        self.bin_step,
                        swap_for_y,
                        state.amount_left,
                        &state.fee,
                    )?,
                    SwapKind::ExactOutput => get_amount_in(
                        &bin,
                        price,
                        self.bin_step,
                        swap_for_y,
                        state.amount_left,
                        &state.fee,
                    )?,
                };

                if !step.amount_in_with_fees.is_zero() {
                    bin.apply_swap(swap_for_y, step.amount_in_with_fees, step.amount_out, step.fee)?;
                    state.book(kind, &step)?;
                    state.touched.insert(id, bin);
                    trace!(
                        id,
                        amount_in = %step.amount_in_with_fees,
                        amount_out = %step.amount_out,
                        fee = %step.fee,
                        "swap step"
                    );
                }
            }

            if state.amount_left.is_zero() {
                break;
            }

            state.active_id = self
                .bitmap
                .find_nearest(id, direction)?
                .ok_or(SwapError::NoLiquidity)?;
        }

        Ok(state)
    }

    /// Writes a finished walk back: bins and their index bits, the active
    /// bin, the fee state and one oracle update.
    ///
    /// The oracle folds the state that held since its last update, that is
    /// the pair before this swap. Its write is computed before anything
    /// changes, so every fallible part runs ahead of the first mutation.
    fn commit(
        &mut self,
        state: SwapState<F>,
        swap_for_y: bool,
        timestamp: u64,
    ) -> Result<SwapResult, Error> {
        let bins_crossed = self.active_id.abs_diff(state.active_id);

        let oracle_write = if self.oracle.is_empty() {
            None
        } else {
            Some(self.oracle.prepare_update(
                self.oracle.len(),
                self.sample_lifetime,
                self.oracle_index,
                timestamp,
                self.active_id,
                self.fee.volatility_accumulator(),
                self.fee.delta_id(self.active_id),
            )?)
        };

        for (id, bin) in state.touched {
            self.store_bin(id, bin)?;
        }
        self.active_id = state.active_id;
        self.fee = state.fee;

        if let Some((index, sample)) = oracle_write {
            if let Some(sample) = sample {
                self.oracle.write(index, sample);
            }
            self.oracle_index = index;
        }

        debug!(
            swap_for_y,
            amount_in = %state.amount_in,
            amount_out = %state.amount_out,
            fees = %state.fees,
            active_id = state.active_id,
            bins_crossed,
            "swap executed"
        );

        Ok(SwapResult {
            amount_in: state.amount_in,
            amount_out: state.amount_out,
            fees_paid: state.fees,
            bins_crossed,
            active_id: state.active_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OracleConfig, PairConfig};
    use crate::error::StateError;
    use crate::math::bin_bitmap::BinBitmap;
    use crate::math::fee_math::StaticFee;
    use crate::{ID_MID, SCALE};

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    fn flat_pair(fee: u128) -> LbPair<StaticFee> {
        let config = PairConfig::default();
        LbPair::from_parts(
            &config,
            StaticFee::new(fee, config.active_id),
            FastMap::default(),
            BinBitmap::new(),
        )
        .unwrap()
    }

    /// Bins M-1 (0, 1000), M (500, 500), M+1 (1000, 0).
    fn three_bins<F: FeeStrategy>(pair: &mut LbPair<F>) {
        pair.deposit(ID_MID - 1, U256::ZERO, u(1_000), U256::ZERO).unwrap();
        pair.deposit(ID_MID, u(500), u(500), U256::ZERO).unwrap();
        pair.deposit(ID_MID + 1, u(1_000), U256::ZERO, U256::ZERO).unwrap();
    }

    // ------------------------- argument checks -------------------------

    #[test]
    fn test_zero_amount() {
        let mut pair = flat_pair(0);
        three_bins(&mut pair);
        assert!(matches!(
            pair.quote_given_input(U256::ZERO, true, 0),
            Err(Error::SwapError(SwapError::ZeroAmount))
        ));
        assert!(matches!(
            pair.execute_exact_output(U256::ZERO, false, 0),
            Err(Error::SwapError(SwapError::ZeroAmount))
        ));
    }

    #[test]
    fn test_empty_pair_has_no_liquidity() {
        let mut pair = flat_pair(0);
        assert!(matches!(
            pair.execute(u(1), true, 0),
            Err(Error::SwapError(SwapError::NoLiquidity))
        ));
    }

    // ------------------------- exact input -------------------------

    #[test]
    fn test_swap_within_active_bin() {
        let mut pair = flat_pair(0);
        three_bins(&mut pair);
        let result = pair.execute(u(100), true, 0).unwrap();
        assert_eq!(result.amount_in, u(100));
        assert_eq!(result.amount_out, u(100));
        assert_eq!(result.fees_paid, U256::ZERO);
        assert_eq!(result.active_id, ID_MID);
        assert_eq!(result.bins_crossed, 0);

        let bin = pair.get_bin(ID_MID);
        assert_eq!(bin.reserve_x, u(600));
        assert_eq!(bin.reserve_y, u(400));
    }

    #[test]
    fn test_swap_crosses_into_next_bin() {
        let mut pair = flat_pair(0);
        three_bins(&mut pair);
        let result = pair.execute(u(700), false, 0).unwrap();
        // 500 X at 1.0, then 200 Y buys floor(200 / 1.0025) = 199 X
        assert_eq!(result.amount_out, u(699));
        assert_eq!(result.active_id, ID_MID + 1);
        assert_eq!(result.bins_crossed, 1);
        assert_eq!(pair.active_id(), ID_MID + 1);
        assert!(pair.get_bin(ID_MID).reserve_x.is_zero());
        assert_eq!(pair.get_bin(ID_MID).reserve_y, u(1_000));
        assert_eq!(pair.get_bin(ID_MID + 1).reserve_y, u(200));
    }

    #[test]
    fn test_skips_bins_without_output_reserve() {
        let mut pair = flat_pair(0);
        // active bin only holds X: a swap for Y must jump to M-1
        pair.deposit(ID_MID, u(500), U256::ZERO, U256::ZERO).unwrap();
        pair.deposit(ID_MID - 40, U256::ZERO, u(1_000), U256::ZERO).unwrap();
        let result = pair.execute(u(10), true, 0).unwrap();
        assert_eq!(result.active_id, ID_MID - 40);
        assert_eq!(result.bins_crossed, 40);
        assert!(result.amount_out > U256::ZERO);
    }

    #[test]
    fn test_quote_matches_execute_and_does_not_mutate() {
        let mut pair = LbPair::new(&PairConfig::default()).unwrap();
        three_bins(&mut pair);
        let before_bins = pair.bins().clone();
        let before_fee = pair.fee().clone();

        let (out, fees) = pair.quote_given_input(u(900), true, 50).unwrap();
        assert_eq!(pair.bins(), &before_bins);
        assert_eq!(pair.fee(), &before_fee);
        assert_eq!(pair.active_id(), ID_MID);

        let result = pair.execute(u(900), true, 50).unwrap();
        assert_eq!(result.amount_out, out);
        assert_eq!(result.fees_paid, fees);
    }

    #[test]
    fn test_fee_credited_per_share() {
        let mut pair = flat_pair(10_000_000_000_000_000); // 1%
        pair.deposit(ID_MID, U256::ZERO, u(1_000), u(1_000)).unwrap();
        let result = pair.execute(u(100), true, 0).unwrap();
        assert_eq!(result.fees_paid, u(1));

        let bin = pair.get_bin(ID_MID);
        assert_eq!(bin.reserve_x, u(99));
        assert_eq!(bin.fee_growth_x, SCALE / u(1_000));
        assert_eq!(bin.reserve_y, u(1_000) - result.amount_out);
    }

    // ------------------------- exact output -------------------------

    #[test]
    fn test_exact_output_pays_requested_amount() {
        let mut pair = flat_pair(3_000_000_000_000_000); // 0.3%
        three_bins(&mut pair);
        let (quoted_in, _) = pair.quote_given_output(u(800), false, 0).unwrap();
        let result = pair.execute_exact_output(u(800), false, 0).unwrap();
        assert_eq!(result.amount_out, u(800));
        assert_eq!(result.amount_in, quoted_in);
        assert_eq!(result.active_id, ID_MID + 1);
        assert!(result.fees_paid > U256::ZERO);
    }

    #[test]
    fn test_exact_output_beyond_liquidity_fails() {
        let mut pair = flat_pair(0);
        three_bins(&mut pair);
        let before = pair.bins().clone();
        assert!(matches!(
            pair.execute_exact_output(u(1_501), false, 0),
            Err(Error::SwapError(SwapError::NoLiquidity))
        ));
        assert_eq!(pair.bins(), &before);
        assert_eq!(pair.active_id(), ID_MID);
    }

    // ------------------------- transactional guarantees -------------------------

    #[test]
    fn test_no_liquidity_leaves_pair_untouched() {
        let mut pair = LbPair::new(&PairConfig::default()).unwrap();
        three_bins(&mut pair);
        let bins = pair.bins().clone();
        let bitmap = pair.bitmap().clone();
        let fee = pair.fee().clone();

        assert!(matches!(
            pair.execute(u(1_000_000), true, 10),
            Err(Error::SwapError(SwapError::NoLiquidity))
        ));
        assert_eq!(pair.bins(), &bins);
        assert_eq!(pair.bitmap(), &bitmap);
        assert_eq!(pair.fee(), &fee);
        assert_eq!(pair.active_id(), ID_MID);
    }

    #[test]
    fn test_step_budget() {
        let config = PairConfig {
            max_bins_per_swap: 2,
            ..PairConfig::default()
        };
        let mut pair = LbPair::new(&config).unwrap();
        three_bins(&mut pair);
        pair.deposit(ID_MID - 2, U256::ZERO, u(1_000), U256::ZERO).unwrap();

        // two bins are enough
        assert!(pair.quote_given_input(u(900), true, 0).is_ok());
        // three are not
        let bins = pair.bins().clone();
        assert!(matches!(
            pair.execute(u(1_600), true, 0),
            Err(Error::SwapError(SwapError::StepBudgetExhausted))
        ));
        assert_eq!(pair.bins(), &bins);
    }

    #[test]
    fn test_swap_updates_oracle() {
        let config = PairConfig {
            oracle: OracleConfig {
                sample_lifetime: 10,
                initial_length: 4,
            },
            ..PairConfig::default()
        };
        let mut pair = LbPair::new(&config).unwrap();
        three_bins(&mut pair);

        pair.execute(u(10), true, 100).unwrap();
        assert_eq!(pair.oracle_index(), 0);
        let opened = pair.oracle().sample(0).unwrap();
        assert_eq!(opened.created_at, 100);

        // crosses into M-1 at t=120; the 20s before it were spent at M
        pair.execute(u(600), true, 120).unwrap();
        assert_eq!(pair.active_id(), ID_MID - 1);
        assert_eq!(pair.oracle_index(), 1);
        let sample = pair.oracle().sample(1).unwrap();
        assert_eq!(sample.timestamp, 120);
        assert_eq!(sample.cumulative_id, ID_MID as u64 * 20);
        assert_eq!(sample.cumulative_volatility, 0);
        assert_eq!(sample.cumulative_bins_crossed, 0);

        let twap = pair.twap(20, 140).unwrap();
        assert_eq!(twap.mean_id, ID_MID - 1);
        assert_eq!(twap.mean_volatility, 10_000);
        assert_eq!(twap.bins_crossed, 20);

        let twap = pair.twap(40, 140).unwrap();
        // (M * 20 + (M - 1) * 20) / 40 rounds down
        assert_eq!(twap.mean_id, ID_MID - 1);
        assert_eq!(pair.twap(20, 120).unwrap().mean_id, ID_MID);
    }

    #[test]
    fn test_withdraw_after_swap_uses_new_reserves() {
        let mut pair = flat_pair(0);
        three_bins(&mut pair);
        pair.execute(u(100), true, 0).unwrap();
        assert!(matches!(
            pair.withdraw(ID_MID, U256::ZERO, u(401), U256::ZERO),
            Err(Error::StateError(StateError::InsufficientReserves))
        ));
        pair.withdraw(ID_MID, u(600), u(400), U256::ZERO).unwrap();
        assert!(!pair.bitmap().contains(ID_MID));
    }
}
