//! Pair configuration.
//!
//! Everything a host needs to open a pair: bin step, starting bin, fee
//! parameters for [`VariableFee`](crate::math::fee_math::VariableFee),
//! oracle sampling and the per-swap bin budget. Every field has a default,
//! so a config file only has to name what it changes.

use crate::error::StateError;
use crate::{BASIS_POINT_MAX, ID_MID, MAX_BIN_ID};
use serde::{Deserialize, Serialize};

/// Default number of bins a single swap may visit.
pub const DEFAULT_MAX_BINS_PER_SWAP: u32 = 1_000;

/// Parameters of the variable fee model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeParameters {
    /// Base fee multiplier: base fee = `base_factor * bin_step * 1e10`.
    pub base_factor: u16,
    /// Seconds during which consecutive swaps share one reference bin.
    pub filter_period: u16,
    /// Seconds after which carried volatility resets to zero.
    pub decay_period: u16,
    /// Share of the accumulator carried into a new reference, in bp.
    pub reduction_factor: u16,
    pub variable_fee_control: u32,
    pub max_volatility_accumulator: u32,
}

impl Default for FeeParameters {
    fn default() -> Self {
        Self {
            base_factor: 5_000,
            filter_period: 30,
            decay_period: 600,
            reduction_factor: 5_000,
            variable_fee_control: 40_000,
            max_volatility_accumulator: 350_000,
        }
    }
}

/// Oracle sampling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Seconds a sample keeps absorbing updates before the ring advances.
    pub sample_lifetime: u64,
    /// Ring capacity allocated at pair creation; 0 disables the oracle
    /// until it is grown.
    pub initial_length: u16,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            sample_lifetime: 120,
            initial_length: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    /// Price step between adjacent bins, in basis points.
    pub bin_step: u16,
    /// Bin the pair starts trading at.
    pub active_id: u32,
    pub fee: FeeParameters,
    pub oracle: OracleConfig,
    /// Bins a single swap may visit before it is aborted.
    pub max_bins_per_swap: u32,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            bin_step: 25,
            active_id: ID_MID,
            fee: FeeParameters::default(),
            oracle: OracleConfig::default(),
            max_bins_per_swap: DEFAULT_MAX_BINS_PER_SWAP,
        }
    }
}

impl PairConfig {
    /// Parses a config from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StateError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StateError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StateError> {
        if self.bin_step == 0 || self.bin_step > BASIS_POINT_MAX {
            return Err(StateError::InvalidBinStep);
        }
        if self.active_id > MAX_BIN_ID {
            return Err(StateError::BinIdOutOfBounds);
        }
        if self.fee.filter_period >= self.fee.decay_period {
            return Err(StateError::InvalidConfig(
                "filter_period must be shorter than decay_period".to_string(),
            ));
        }
        if self.fee.reduction_factor > BASIS_POINT_MAX {
            return Err(StateError::InvalidConfig(
                "reduction_factor above 10000 bp".to_string(),
            ));
        }
        if self.max_bins_per_swap == 0 {
            return Err(StateError::InvalidConfig(
                "max_bins_per_swap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
