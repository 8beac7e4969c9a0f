use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimals assumed for tokens whose metadata cannot be read.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimal count accepted for unit conversion.
const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Creates a token with decimals taken from [`default_decimals`].
    pub fn with_default_decimals(address: impl Into<String>, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let decimals = default_decimals(&symbol);
        Self::new(address, symbol, decimals)
    }
}

/// Decimal count for well-known symbols when on-chain metadata is unavailable.
pub fn default_decimals(symbol: &str) -> u8 {
    match symbol.to_ascii_uppercase().as_str() {
        "WBTC" => 8,
        "USDC" | "USDT" => 6,
        _ => DEFAULT_DECIMALS,
    }
}

/// An amount in a token's smallest on-chain unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(#[serde(with = "crate::serde_u256")] pub U256);

impl TokenAmount {
    pub fn new(amount: impl Into<U256>) -> Self {
        Self(amount.into())
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Converts a human amount such as `0.1` into base units.
    pub fn from_human(amount: Decimal, decimals: u8) -> Result<Self, MathError> {
        parse_units(amount, decimals).map(Self)
    }

    /// Formats the amount as a human decimal string.
    pub fn to_human(&self, decimals: u8) -> String {
        format_units(self.0, decimals)
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<u128> for TokenAmount {
    fn from(v: u128) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for TokenAmount {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Converts a human decimal amount into base units.
///
/// Fractional digits beyond `decimals` are truncated toward zero.
pub fn parse_units(amount: Decimal, decimals: u8) -> Result<U256, MathError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MathError::InvalidAmount(format!("{amount} is negative")));
    }
    if decimals > MAX_DECIMALS {
        return Err(MathError::InvalidAmount(format!(
            "{decimals} decimals is out of range"
        )));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    let decimals = u32::from(decimals);

    if scale <= decimals {
        mantissa
            .checked_mul(U256::exp10((decimals - scale) as usize))
            .ok_or(MathError::Overflow)
    } else {
        Ok(mantissa / U256::exp10((scale - decimals) as usize))
    }
}

/// Formats base units as a human decimal string without trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_decimals() {
        assert_eq!(default_decimals("WBTC"), 8);
        assert_eq!(default_decimals("usdc"), 6);
        assert_eq!(default_decimals("USDT"), 6);
        assert_eq!(default_decimals("ETH"), 18);
        assert_eq!(default_decimals("LINK"), 18);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(
            parse_units(dec!(0.1), 18).unwrap(),
            U256::from(100_000_000_000_000_000u64)
        );
        assert_eq!(parse_units(dec!(200), 6).unwrap(), U256::from(200_000_000u64));
        assert_eq!(parse_units(dec!(0.05), 8).unwrap(), U256::from(5_000_000u64));
        // Digits beyond the token's precision are dropped.
        assert_eq!(parse_units(dec!(1.2345678), 6).unwrap(), U256::from(1_234_567u64));
        assert_eq!(parse_units(dec!(0), 18).unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_units_rejects_negative() {
        assert!(matches!(
            parse_units(dec!(-1), 18),
            Err(MathError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(199_400_000u64), 6), "199.4");
        assert_eq!(format_units(U256::from(5u64), 6), "0.000005");
        assert_eq!(format_units(U256::exp10(18), 18), "1");
        assert_eq!(format_units(U256::zero(), 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_token_amount_human_conversion() {
        let amount = TokenAmount::from_human(dec!(0.5), 18).unwrap();
        assert_eq!(amount.to_human(18), "0.5");
    }
}
