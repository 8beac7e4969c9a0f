//! Structured actions resolved from natural-language instructions.
//!
//! The JSON form mirrors what the language model is asked to produce:
//! `{"function": "swap", "parameters": {"fromToken": "ETH", ...}}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three router operations an instruction can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "swap")]
    Swap,
    #[serde(rename = "addLiquidity")]
    AddLiquidity,
    #[serde(rename = "removeLiquidity")]
    RemoveLiquidity,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::Swap, Self::AddLiquidity, Self::RemoveLiquidity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::AddLiquidity => "addLiquidity",
            Self::RemoveLiquidity => "removeLiquidity",
        }
    }

    /// Parses a function name exactly as the model must spell it.
    pub fn from_function_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    #[serde(rename = "fromToken")]
    pub from_symbol: String,
    #[serde(rename = "toToken")]
    pub to_symbol: String,
    pub amount: Decimal,
}

/// At least one amount is present; the other is derived from reserves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityParams {
    #[serde(rename = "token0")]
    pub symbol0: String,
    #[serde(rename = "token1")]
    pub symbol1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount0: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount1: Option<Decimal>,
}

/// `percent` is on the 0-100 scale. Amounts refer to `symbol0` / `symbol1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityParams {
    #[serde(rename = "token0")]
    pub symbol0: String,
    #[serde(rename = "token1")]
    pub symbol1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount0: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount1: Option<Decimal>,
}

/// The authoritative withdrawal signal of a `RemoveLiquidity` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalIntent {
    /// Share of the position on the 0-100 scale.
    Percent(Decimal),
    /// Human amount of `symbol0`.
    Amount0(Decimal),
    /// Human amount of `symbol1`.
    Amount1(Decimal),
}

impl RemoveLiquidityParams {
    /// Picks the withdrawal signal: `percent` wins, then `amount0`, then `amount1`.
    pub fn intent(&self) -> Option<WithdrawalIntent> {
        self.percent
            .map(WithdrawalIntent::Percent)
            .or(self.amount0.map(WithdrawalIntent::Amount0))
            .or(self.amount1.map(WithdrawalIntent::Amount1))
    }
}

/// A validated, unambiguous request against a single pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", content = "parameters")]
pub enum Action {
    #[serde(rename = "swap")]
    Swap(SwapParams),
    #[serde(rename = "addLiquidity")]
    AddLiquidity(AddLiquidityParams),
    #[serde(rename = "removeLiquidity")]
    RemoveLiquidity(RemoveLiquidityParams),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Swap(_) => ActionKind::Swap,
            Self::AddLiquidity(_) => ActionKind::AddLiquidity,
            Self::RemoveLiquidity(_) => ActionKind::RemoveLiquidity,
        }
    }

    /// Every token symbol the action references.
    pub fn symbols(&self) -> [&str; 2] {
        match self {
            Self::Swap(p) => [&p.from_symbol, &p.to_symbol],
            Self::AddLiquidity(p) => [&p.symbol0, &p.symbol1],
            Self::RemoveLiquidity(p) => [&p.symbol0, &p.symbol1],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swap(p) => write!(f, "Swap {} {} for {}", p.amount, p.from_symbol, p.to_symbol),
            Self::AddLiquidity(p) => match (p.amount0, p.amount1) {
                (Some(a0), Some(a1)) => write!(
                    f,
                    "Add liquidity with {a0} {} and {a1} {}",
                    p.symbol0, p.symbol1
                ),
                (Some(a0), None) => write!(
                    f,
                    "Add liquidity with {a0} {} and matching {}",
                    p.symbol0, p.symbol1
                ),
                (None, Some(a1)) => write!(
                    f,
                    "Add liquidity with {a1} {} and matching {}",
                    p.symbol1, p.symbol0
                ),
                (None, None) => write!(f, "Add liquidity to {}/{} pool", p.symbol0, p.symbol1),
            },
            Self::RemoveLiquidity(p) => {
                let pair = format!("{}/{}", p.symbol0, p.symbol1);
                match p.intent() {
                    Some(WithdrawalIntent::Percent(pct)) => {
                        write!(f, "Remove {pct}% of liquidity from {pair} pool")
                    }
                    Some(WithdrawalIntent::Amount0(a)) => {
                        write!(f, "Remove liquidity worth {a} {} from {pair} pool", p.symbol0)
                    }
                    Some(WithdrawalIntent::Amount1(a)) => {
                        write!(f, "Remove liquidity worth {a} {} from {pair} pool", p.symbol1)
                    }
                    None => write!(f, "Remove liquidity from {pair} pool"),
                }
            }
        }
    }
}
