use crate::token::{Token, TokenAmount, default_decimals};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Fee charged by every Uniswap V2 pair, in basis points.
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Which side of a pair a token occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolSide {
    Token0,
    Token1,
}

impl PoolSide {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Token0 => Self::Token1,
            Self::Token1 => Self::Token0,
        }
    }
}

/// Immutable view of one trading pair at a point in time.
///
/// Snapshots are replaced wholesale on refresh and shared behind `Arc`; nothing
/// mutates a snapshot once it has been handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    pub address: String,
    pub token0: String,
    pub token1: String,
    pub token0_symbol: String,
    pub token1_symbol: String,
    #[serde(with = "crate::serde_u256")]
    pub reserve0: U256,
    #[serde(with = "crate::serde_u256")]
    pub reserve1: U256,
    #[serde(default = "default_fee_bps")]
    pub fee_rate_bps: u32,
    pub decimals0: u8,
    pub decimals1: u8,
    /// `blockTimestampLast` reported by the pair, if known.
    #[serde(default)]
    pub block_timestamp_last: Option<u32>,
}

fn default_fee_bps() -> u32 {
    DEFAULT_FEE_BPS
}

impl PoolSnapshot {
    /// Builds a snapshot from two tokens and their reserves.
    pub fn new(
        address: impl Into<String>,
        token0: Token,
        token1: Token,
        reserve0: impl Into<U256>,
        reserve1: impl Into<U256>,
    ) -> Self {
        Self {
            address: address.into(),
            token0: token0.address,
            token1: token1.address,
            token0_symbol: token0.symbol,
            token1_symbol: token1.symbol,
            reserve0: reserve0.into(),
            reserve1: reserve1.into(),
            fee_rate_bps: DEFAULT_FEE_BPS,
            decimals0: token0.decimals,
            decimals1: token1.decimals,
            block_timestamp_last: None,
        }
    }

    /// Builds a snapshot whose decimals come from the symbol registry.
    pub fn from_symbols(
        address: impl Into<String>,
        token0: (&str, &str),
        token1: (&str, &str),
        reserve0: impl Into<U256>,
        reserve1: impl Into<U256>,
    ) -> Self {
        Self::new(
            address,
            Token::with_default_decimals(token0.0, token0.1),
            Token::with_default_decimals(token1.0, token1.1),
            reserve0,
            reserve1,
        )
    }

    pub fn token(&self, side: PoolSide) -> Token {
        match side {
            PoolSide::Token0 => Token::new(&self.token0, &self.token0_symbol, self.decimals0),
            PoolSide::Token1 => Token::new(&self.token1, &self.token1_symbol, self.decimals1),
        }
    }

    pub fn symbol(&self, side: PoolSide) -> &str {
        match side {
            PoolSide::Token0 => &self.token0_symbol,
            PoolSide::Token1 => &self.token1_symbol,
        }
    }

    pub fn token_address(&self, side: PoolSide) -> &str {
        match side {
            PoolSide::Token0 => &self.token0,
            PoolSide::Token1 => &self.token1,
        }
    }

    pub fn reserve(&self, side: PoolSide) -> U256 {
        match side {
            PoolSide::Token0 => self.reserve0,
            PoolSide::Token1 => self.reserve1,
        }
    }

    pub fn decimals(&self, side: PoolSide) -> u8 {
        match side {
            PoolSide::Token0 => self.decimals0,
            PoolSide::Token1 => self.decimals1,
        }
    }

    /// `(reserve_in, reserve_out)` for a trade entering on `side_in`.
    pub fn reserves_for(&self, side_in: PoolSide) -> (TokenAmount, TokenAmount) {
        (
            TokenAmount(self.reserve(side_in)),
            TokenAmount(self.reserve(side_in.other())),
        )
    }

    /// Finds the side whose symbol matches, ignoring ASCII case.
    pub fn side_of_symbol(&self, symbol: &str) -> Option<PoolSide> {
        let symbol = symbol.trim();
        if self.token0_symbol.eq_ignore_ascii_case(symbol) {
            Some(PoolSide::Token0)
        } else if self.token1_symbol.eq_ignore_ascii_case(symbol) {
            Some(PoolSide::Token1)
        } else {
            None
        }
    }

    /// Whether both reserves are non-zero.
    pub fn is_tradable(&self) -> bool {
        !self.reserve0.is_zero() && !self.reserve1.is_zero()
    }

    /// Pair label such as `ETH/USDC`.
    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.token0_symbol, self.token1_symbol)
    }

    /// Returns a copy with new reserves; the receiver is left untouched.
    #[must_use]
    pub fn with_reserves(&self, reserve0: U256, reserve1: U256) -> Self {
        Self {
            reserve0,
            reserve1,
            ..self.clone()
        }
    }

    /// Decimals to use for a symbol that may or may not belong to this pool.
    pub fn decimals_for_symbol(&self, symbol: &str) -> u8 {
        self.side_of_symbol(symbol)
            .map(|side| self.decimals(side))
            .unwrap_or_else(|| default_decimals(symbol))
    }
}
