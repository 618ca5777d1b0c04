pub mod math_helpers;

pub mod bit_math;

pub mod bin_bitmap;
pub mod price_math;

pub mod bin_math;
pub mod fee_math;
