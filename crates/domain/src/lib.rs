//! Domain model for the natural-language AMM front-end.
//!
//! This crate holds everything that is pure and chain-agnostic:
//! - Pool snapshots and token metadata
//! - Human amount / base unit conversion
//! - The structured `Action` produced from user instructions
//! - Constant-product reserve math

/// Structured user actions.
pub mod action;
/// Domain errors.
pub mod error;
/// Reserve math.
pub mod math;
/// Pool snapshots.
pub mod pool;
/// Serde helpers for base-unit integers.
pub mod serde_u256;
/// Tokens and unit conversion.
pub mod token;
/// Value objects.
pub mod value_objects;

pub use action::{
    Action, ActionKind, AddLiquidityParams, RemoveLiquidityParams, SwapParams, WithdrawalIntent,
};
pub use error::MathError;
pub use pool::{PoolSide, PoolSnapshot};
pub use token::{Token, TokenAmount};
pub use value_objects::percentage::Percentage;
