#![allow(dead_code)]

use criterion::{black_box, Criterion};
use dlmm_swap_math::config::PairConfig;
use dlmm_swap_math::math::bin_bitmap::BinBitmap;
use dlmm_swap_math::math::bit_math::{
    closest_bit, least_significant_bit, most_significant_bit, Direction,
};
use dlmm_swap_math::math::math_helpers::{mul_div, mul_div_rounding_up, shift_div_round_up};
use dlmm_swap_math::math::price_math::get_price_from_id;
use dlmm_swap_math::{LbPair, ID_MID, SCALE, U256};

/// Pair with 200 bins of liquidity on each side of the mid bin.
pub fn deep_pair() -> LbPair {
    let mut pair = LbPair::new(&PairConfig::default()).unwrap();
    let depth = U256::from(1_000_000_000_000_000_000u128);
    for offset in 1..=200u32 {
        pair.deposit(ID_MID - offset, U256::ZERO, depth, U256::ZERO).unwrap();
        pair.deposit(ID_MID + offset, depth, U256::ZERO, U256::ZERO).unwrap();
    }
    pair.deposit(ID_MID, depth, depth, U256::ZERO).unwrap();
    pair
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::MAX >> 3usize;
    let b = U256::from(0x1234_5678_9abc_def0u64) << 100usize;
    let d = U256::MAX >> 1usize;

    c.bench_function("math_helpers/mul_div", |bench| {
        bench.iter(|| mul_div(black_box(a), black_box(b), black_box(d)))
    });
    c.bench_function("math_helpers/mul_div_rounding_up", |bench| {
        bench.iter(|| mul_div_rounding_up(black_box(a), black_box(b), black_box(d)))
    });
    c.bench_function("math_helpers/shift_div_round_up", |bench| {
        bench.iter(|| shift_div_round_up(black_box(U256::from(1_000u64)), 128, black_box(SCALE)))
    });
}

pub fn bench_bit_math(c: &mut Criterion) {
    let word = (U256::ONE << 200usize) | (U256::ONE << 17usize);

    c.bench_function("bit_math/most_significant_bit", |bench| {
        bench.iter(|| most_significant_bit(black_box(word)))
    });
    c.bench_function("bit_math/least_significant_bit", |bench| {
        bench.iter(|| least_significant_bit(black_box(word)))
    });
    c.bench_function("bit_math/closest_bit_lower", |bench| {
        bench.iter(|| closest_bit(black_box(word), black_box(150), Direction::Lower))
    });
}

pub fn bench_price_math(c: &mut Criterion) {
    c.bench_function("price_math/price_at_mid", |bench| {
        bench.iter(|| get_price_from_id(black_box(ID_MID), black_box(25)))
    });
    c.bench_function("price_math/price_far_below_mid", |bench| {
        bench.iter(|| get_price_from_id(black_box(ID_MID - 50_000), black_box(10)))
    });
    c.bench_function("price_math/price_far_above_mid", |bench| {
        bench.iter(|| get_price_from_id(black_box(ID_MID + 50_000), black_box(10)))
    });
}

pub fn bench_bin_bitmap(c: &mut Criterion) {
    let mut sparse = BinBitmap::new();
    for id in [10u32, ID_MID - 300_000, ID_MID + 1, ID_MID + 70_000] {
        sparse.insert(id).unwrap();
    }

    c.bench_function("bin_bitmap/find_nearest_same_leaf", |bench| {
        bench.iter(|| sparse.find_nearest(black_box(ID_MID), Direction::Higher))
    });
    c.bench_function("bin_bitmap/find_nearest_across_root", |bench| {
        bench.iter(|| sparse.find_nearest(black_box(ID_MID - 2), Direction::Lower))
    });
    c.bench_function("bin_bitmap/insert_remove", |bench| {
        bench.iter(|| {
            let mut bitmap = sparse.clone();
            bitmap.insert(black_box(ID_MID + 5)).unwrap();
            bitmap.remove(black_box(ID_MID + 5)).unwrap();
        })
    });
}

pub fn bench_swap(c: &mut Criterion) {
    let pair = deep_pair();
    let one_bin = U256::from(100_000_000_000_000_000u128);
    let many_bins = U256::from(50_000_000_000_000_000_000u128);

    c.bench_function("swap/quote_within_active_bin", |bench| {
        bench.iter(|| pair.quote_given_input(black_box(one_bin), true, 0))
    });
    c.bench_function("swap/quote_across_50_bins", |bench| {
        bench.iter(|| pair.quote_given_input(black_box(many_bins), false, 0))
    });
    c.bench_function("swap/quote_exact_output_across_50_bins", |bench| {
        bench.iter(|| pair.quote_given_output(black_box(many_bins), true, 0))
    });
}
