//! Serialises `U256` as a decimal string.
//!
//! Base-unit amounts must survive the JSON boundary without passing through a
//! float, so they are written as `"20000000000"` and accepted either as a decimal
//! string, a `0x` hex string or a JSON integer.

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Serialises a `U256` as a decimal string.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserialises a `U256` from a decimal string, hex string or integer.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    deserializer.deserialize_any(U256Visitor)
}

/// Parses a decimal or `0x`-prefixed hex string into a `U256`.
pub fn parse_u256(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return U256::from_str_radix(hex, 16).ok();
    }
    U256::from_dec_str(raw).ok()
}

struct U256Visitor;

impl<'de> Visitor<'de> for U256Visitor {
    type Value = U256;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer as a decimal string, hex string or number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom("negative amount"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
        parse_u256(v).ok_or_else(|| E::custom(format!("invalid integer: {v}")))
    }
}

/// Same as the parent module, for `Option<U256>`.
pub mod option {
    use super::*;
    use serde::Deserialize;

    /// Serialises `Some` as a decimal string and `None` as null.
    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialises an optional `U256`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super")] U256);

        Option::<Wrapper>::deserialize(deserializer).map(|w| w.map(|Wrapper(v)| v))
    }
}
