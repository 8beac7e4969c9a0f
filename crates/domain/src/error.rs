use thiserror::Error;

/// Failures of reserve math and unit conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// A derived amount needed a non-zero reserve.
    #[error("Cannot calculate amount: insufficient reserves")]
    InsufficientReserves,
    /// The intermediate or final value does not fit in 256 bits.
    #[error("Arithmetic overflow")]
    Overflow,
    /// The amount is negative, malformed or has too many digits.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
