use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - bin id out of bounds")]
    BinIdOutOfBounds,
    #[error("State error - bin step must be within 1..=10000")]
    InvalidBinStep,
    #[error("State error - requested amount exceeds bin reserves")]
    InsufficientReserves,
    #[error("State error - invalid pair configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - amount is 0")]
    ZeroAmount,
    #[error("Swap error - no liquidity left in the swap direction")]
    NoLiquidity,
    #[error("Swap error - bin walk exceeded the step budget")]
    StepBudgetExhausted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle error - lookup timestamp is older than the oldest sample")]
    TooOld,
    #[error("Oracle error - no sample recorded")]
    NotInitialized,
    #[error("Oracle error - invalid oracle length")]
    InvalidLength,
    #[error("Oracle error - lookup timestamp is in the future")]
    FutureTimestamp,
    #[error("Oracle error - averaging window is 0")]
    ZeroWindow,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    SwapError(#[from] crate::error::SwapError),

    #[error(transparent)]
    OracleError(#[from] crate::error::OracleError),
}
