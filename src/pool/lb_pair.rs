use crate::config::PairConfig;
use crate::error::{Error, MathError, OracleError, StateError};
use crate::math::bin_bitmap::BinBitmap;
use crate::math::bit_math::Direction;
use crate::math::fee_math::{FeeStrategy, VariableFee};
use crate::math::price_math::get_price_from_id;
use crate::pool::bin::{Bin, BinStore};
use crate::pool::oracle::{Cumulatives, Oracle};
use crate::{FastMap, MAX_BIN_ID};
use alloy_primitives::U256;
use tracing::debug;

/// Time‑weighted averages read from the oracle over a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Twap {
    pub mean_id: u32,
    /// 128.128 price of `mean_id`.
    pub price: U256,
    pub mean_volatility: u32,
    pub bins_crossed: u64,
}

/// A liquidity‑book pair: bin reserves, the index of non‑empty bins, the
/// fee state and the oracle ring.
///
/// Bin storage is abstracted by [`BinStore`] so the host decides where bins
/// live; [`LbPair::new`] keeps them in memory. Every mutating call either
/// commits completely or returns an error with the pair untouched.
#[derive(Clone, Debug)]
pub struct LbPair<F: FeeStrategy = VariableFee, S: BinStore = FastMap<u32, Bin>> {
    pub(crate) bin_step: u16,
    pub(crate) active_id: u32,
    pub(crate) fee: F,
    pub(crate) bins: S,
    pub(crate) bitmap: BinBitmap,
    pub(crate) oracle: Oracle,
    pub(crate) oracle_index: u16,
    pub(crate) sample_lifetime: u64,
    pub(crate) max_bins_per_swap: u32,
}

impl LbPair {
    /// Opens an empty in‑memory pair with the variable fee model.
    pub fn new(config: &PairConfig) -> Result<Self, Error> {
        let fee = VariableFee::new(config.fee.clone(), config.active_id);
        Self::from_parts(config, fee, FastMap::default(), BinBitmap::new())
    }
}

impl<F: FeeStrategy, S: BinStore> LbPair<F, S> {
    /// Builds a pair over host‑provided storage.
    ///
    /// `bitmap` must mark exactly the non‑empty bins of `bins`; a fresh store
    /// goes with [`BinBitmap::new`].
    pub fn from_parts(config: &PairConfig, fee: F, bins: S, bitmap: BinBitmap) -> Result<Self, Error> {
        config.validate()?;

        let mut oracle = Oracle::new();
        if config.oracle.initial_length > 0 {
            oracle.initialize(config.oracle.initial_length - 1)?;
        }

        Ok(Self {
            bin_step: config.bin_step,
            active_id: config.active_id,
            fee,
            bins,
            bitmap,
            oracle,
            oracle_index: 0,
            sample_lifetime: config.oracle.sample_lifetime,
            max_bins_per_swap: config.max_bins_per_swap,
        })
    }

    #[inline]
    pub fn active_id(&self) -> u32 {
        self.active_id
    }

    #[inline]
    pub fn bin_step(&self) -> u16 {
        self.bin_step
    }

    pub fn fee(&self) -> &F {
        &self.fee
    }

    pub fn bitmap(&self) -> &BinBitmap {
        &self.bitmap
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn oracle_index(&self) -> u16 {
        self.oracle_index
    }

    pub fn bins(&self) -> &S {
        &self.bins
    }

    pub fn get_bin(&self, id: u32) -> Bin {
        self.bins.get_bin(id)
    }

    /// Price of the active bin.
    pub fn active_price(&self) -> Result<U256, Error> {
        get_price_from_id(self.active_id, self.bin_step)
    }

    /// Nearest non‑empty bin strictly beyond `id` in the direction a swap
    /// with `swap_for_y` walks.
    pub fn get_next_non_empty_bin(&self, id: u32, swap_for_y: bool) -> Result<Option<u32>, Error> {
        self.bitmap.find_nearest(id, Direction::for_swap(swap_for_y))
    }

    /// Adds reserves (and the shares minted for them) to bin `id`.
    ///
    /// Share amounts are decided by the host; this only books them so swap
    /// fees can be credited per share.
    pub fn deposit(
        &mut self,
        id: u32,
        amount_x: U256,
        amount_y: U256,
        shares: U256,
    ) -> Result<Bin, Error> {
        if id > MAX_BIN_ID {
            return Err(StateError::BinIdOutOfBounds.into());
        }
        let mut bin = self.bins.get_bin(id);
        bin.reserve_x = bin.reserve_x.checked_add(amount_x).ok_or(MathError::Overflow)?;
        bin.reserve_y = bin.reserve_y.checked_add(amount_y).ok_or(MathError::Overflow)?;
        bin.total_supply = bin.total_supply.checked_add(shares).ok_or(MathError::Overflow)?;

        self.store_bin(id, bin)?;
        debug!(id, %amount_x, %amount_y, "liquidity deposited");
        Ok(bin)
    }

    /// Removes reserves (and burnt shares) from bin `id`.
    pub fn withdraw(
        &mut self,
        id: u32,
        amount_x: U256,
        amount_y: U256,
        shares: U256,
    ) -> Result<Bin, Error> {
        if id > MAX_BIN_ID {
            return Err(StateError::BinIdOutOfBounds.into());
        }
        let mut bin = self.bins.get_bin(id);
        bin.reserve_x = bin
            .reserve_x
            .checked_sub(amount_x)
            .ok_or(StateError::InsufficientReserves)?;
        bin.reserve_y = bin
            .reserve_y
            .checked_sub(amount_y)
            .ok_or(StateError::InsufficientReserves)?;
        bin.total_supply = bin
            .total_supply
            .checked_sub(shares)
            .ok_or(StateError::InsufficientReserves)?;

        self.store_bin(id, bin)?;
        debug!(id, %amount_x, %amount_y, "liquidity withdrawn");
        Ok(bin)
    }

    /// Writes a bin and keeps the index in step with its emptiness.
    pub(crate) fn store_bin(&mut self, id: u32, bin: Bin) -> Result<(), Error> {
        if bin.is_empty() {
            self.bitmap.remove(id)?;
        } else {
            self.bitmap.insert(id)?;
        }
        self.bins.set_bin(id, bin);
        Ok(())
    }

    /// Grows the oracle ring to `new_length` slots.
    pub fn increase_oracle_length(&mut self, new_length: u16) -> Result<(), Error> {
        self.oracle_index = self.oracle.increase_length(self.oracle_index, new_length)?;
        Ok(())
    }

    /// Oracle cumulatives at `lookup`, seen from time `now`.
    ///
    /// Past the newest sample the cumulatives are extrapolated with the
    /// current active id and volatility, as the next update would fold them.
    pub fn oracle_sample_at(&self, lookup: u64, now: u64) -> Result<Cumulatives, Error> {
        if lookup > now {
            return Err(OracleError::FutureTimestamp.into());
        }
        let size = self.oracle.len();
        let newest = self
            .oracle
            .sample(self.oracle_index)
            .ok_or(OracleError::NotInitialized)?;

        if lookup > newest.timestamp {
            let extrapolated = newest.accumulate(
                lookup,
                self.active_id,
                self.fee.volatility_accumulator(),
                self.fee.delta_id(self.active_id),
            )?;
            return Ok(extrapolated.cumulatives());
        }

        Ok(self.oracle.sample_at(size, self.oracle_index, lookup)?)
    }

    /// Time‑weighted averages over the `window` seconds before `now`.
    pub fn twap(&self, window: u64, now: u64) -> Result<Twap, Error> {
        if window == 0 {
            return Err(OracleError::ZeroWindow.into());
        }
        let start = now.checked_sub(window).ok_or(OracleError::TooOld)?;
        let end_cumulatives = self.oracle_sample_at(now, now)?;
        let start_cumulatives = self.oracle_sample_at(start, now)?;

        let mean = |end: u64, begin: u64| {
            end.checked_sub(begin)
                .map(|delta| delta / window)
                .ok_or(MathError::Underflow)
        };
        let mean_id = mean(end_cumulatives.id, start_cumulatives.id)? as u32;
        let mean_volatility = mean(end_cumulatives.volatility, start_cumulatives.volatility)? as u32;
        let bins_crossed = end_cumulatives
            .bins_crossed
            .checked_sub(start_cumulatives.bins_crossed)
            .ok_or(MathError::Underflow)?;

        Ok(Twap {
            mean_id,
            price: get_price_from_id(mean_id, self.bin_step)?,
            mean_volatility,
            bins_crossed,
        })
    }

    /// Time‑weighted mean price over the `window` seconds before `now`.
    pub fn twap_price(&self, window: u64, now: u64) -> Result<U256, Error> {
        Ok(self.twap(window, now)?.price)
    }
}
