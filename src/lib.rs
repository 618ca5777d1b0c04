//! Liquidity‑book (discrete bin) AMM math and swap simulation in pure Rust.
//!
//! Liquidity sits in discrete price bins. Bin `id` trades at the fixed
//! price `(1 + bin_step / 10_000) ^ (id - ID_MID)`, so a swap walks from the
//! active bin outward, draining bins until the requested amount is filled.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`): 512‑bit mul/div, bit scans,
//!   bin prices, the sparse bin bitmap, fees and per‑bin swap amounts.
//! - An in‑memory [`LbPair`] that quotes and executes swaps transactionally
//!   and keeps a time‑weighted oracle of the active bin.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use dlmm_swap_math::{math::price_math, ID_MID, SCALE};
//!
//! let price = price_math::get_price_from_id(ID_MID, 25).unwrap();
//! assert_eq!(price, SCALE);
//! ```
//!
//! ## Simulating a swap in an in‑memory pair
//! ```no_run
//! use dlmm_swap_math::{config::PairConfig, LbPair, ID_MID, U256};
//!
//! let mut pair = LbPair::new(&PairConfig::default()).unwrap();
//! pair.deposit(ID_MID, U256::from(1_000u64), U256::from(1_000u64), U256::ZERO).unwrap();
//! pair.deposit(ID_MID - 1, U256::ZERO, U256::from(1_000u64), U256::ZERO).unwrap();
//!
//! let swap_for_y = true;
//! let (amount_out, fees) = pair.quote_given_input(U256::from(1_500u64), swap_for_y, 0).unwrap();
//! let result = pair.execute(U256::from(1_500u64), swap_for_y, 0).unwrap();
//! assert_eq!(result.amount_out, amount_out);
//! println!("out: {}, fees: {}, active bin: {}", amount_out, fees, result.active_id);
//! ```

pub use alloy_primitives::U256;

pub mod config;
pub mod error;
mod hash;
pub mod math;

pub use hash::FastMap;

pub mod pool;

pub use pool::lb_pair::LbPair;

/// Fractional bits of a 128.128 price.
pub const SCALE_OFFSET: u8 = 128;
/// `1.0` as a 128.128 price.
pub const SCALE: U256 = U256::from_limbs([0, 0, 1, 0]);

pub const BASIS_POINT_MAX: u16 = 10_000;

/// Fee rates are fractions of `PRECISION` (1e18).
pub const PRECISION: u128 = 1_000_000_000_000_000_000;
/// Hard cap on any fee rate: 10%.
pub const MAX_FEE: u128 = 100_000_000_000_000_000;

/// Bin whose price is exactly 1.0.
pub const ID_MID: u32 = 1 << 23;
/// Bin ids are 24 bits wide.
pub const MAX_BIN_ID: u32 = (1 << 24) - 1;
