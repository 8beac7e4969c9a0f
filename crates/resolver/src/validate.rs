//! Deterministic validation of a parsed model answer.
//!
//! Checks run in a fixed order and stop at the first failure: model error,
//! function name, parameters object, token grounding, then amounts.

use crate::error::ResolveError;
use nlswap_domain::{
    Action, ActionKind, AddLiquidityParams, PoolSnapshot, RemoveLiquidityParams, SwapParams,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Turns a model answer into an [`Action`] grounded in `pool`.
///
/// # Errors
/// Returns the first failing check as a [`ResolveError`].
pub fn validate_response(
    response: &Map<String, Value>,
    pool: &PoolSnapshot,
) -> Result<Action, ResolveError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ResolveError::UserInstructionUnclear(message));
    }

    let function = match response.get("function") {
        None | Some(Value::Null) => return Err(ResolveError::InvalidFunction(None)),
        Some(Value::String(name)) => name.as_str(),
        Some(other) => return Err(ResolveError::InvalidFunction(Some(other.to_string()))),
    };
    let kind = ActionKind::from_function_name(function)
        .ok_or_else(|| ResolveError::InvalidFunction(Some(function.to_string())))?;

    let params = match response.get("parameters") {
        Some(Value::Object(params)) => params,
        _ => return Err(ResolveError::MissingParameters("parameters".to_string())),
    };

    let grounder = Grounder { pool };
    match kind {
        ActionKind::Swap => {
            let from_symbol = grounder.symbol(params, "fromToken")?;
            let to_symbol = grounder.symbol(params, "toToken")?;
            if from_symbol == to_symbol {
                return Err(ResolveError::invalid(
                    "toToken",
                    format!("cannot swap {from_symbol} for itself"),
                ));
            }
            let amount = positive_amount(params, "amount")?
                .ok_or_else(|| ResolveError::MissingParameters("amount".to_string()))?;
            Ok(Action::Swap(SwapParams {
                from_symbol,
                to_symbol,
                amount,
            }))
        }
        ActionKind::AddLiquidity => {
            let (symbol0, symbol1) = grounder.pair(params)?;
            let amount0 = positive_amount(params, "amount0")?;
            let amount1 = positive_amount(params, "amount1")?;
            if amount0.is_none() && amount1.is_none() {
                return Err(ResolveError::MissingParameters(
                    "amount0 or amount1".to_string(),
                ));
            }
            Ok(Action::AddLiquidity(AddLiquidityParams {
                symbol0,
                symbol1,
                amount0,
                amount1,
            }))
        }
        ActionKind::RemoveLiquidity => {
            let (symbol0, symbol1) = grounder.pair(params)?;
            // The first signal present wins; the rest are dropped unread.
            let mut removal = RemoveLiquidityParams {
                symbol0,
                symbol1,
                percent: None,
                amount0: None,
                amount1: None,
            };
            if is_present(params, "percent") {
                let percent = positive_amount(params, "percent")?.unwrap_or_default();
                if percent > Decimal::ONE_HUNDRED {
                    return Err(ResolveError::invalid(
                        "percent",
                        format!("{percent} is more than 100"),
                    ));
                }
                removal.percent = Some(percent);
            } else if is_present(params, "amount0") {
                removal.amount0 = positive_amount(params, "amount0")?;
            } else if is_present(params, "amount1") {
                removal.amount1 = positive_amount(params, "amount1")?;
            } else {
                return Err(ResolveError::MissingParameters(
                    "percent, amount0 or amount1".to_string(),
                ));
            }
            Ok(Action::RemoveLiquidity(removal))
        }
    }
}

struct Grounder<'a> {
    pool: &'a PoolSnapshot,
}

impl Grounder<'_> {
    /// Reads a symbol and canonicalises it to the pool's spelling.
    fn symbol(&self, params: &Map<String, Value>, name: &str) -> Result<String, ResolveError> {
        let raw = match params.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(ResolveError::MissingParameters(name.to_string()));
            }
            Some(_) => return Err(ResolveError::invalid(name, "token symbol must be a string")),
        };
        self.pool
            .side_of_symbol(raw)
            .map(|side| self.pool.symbol(side).to_string())
            .ok_or_else(|| ResolveError::UnknownToken {
                symbol: raw.to_string(),
                pair: self.pool.pair_label(),
            })
    }

    /// Reads `token0` / `token1`, which must name the two distinct pool tokens.
    fn pair(&self, params: &Map<String, Value>) -> Result<(String, String), ResolveError> {
        let symbol0 = self.symbol(params, "token0")?;
        let symbol1 = self.symbol(params, "token1")?;
        if symbol0 == symbol1 {
            return Err(ResolveError::invalid(
                "token1",
                format!("both sides name {symbol0}"),
            ));
        }
        Ok((symbol0, symbol1))
    }
}

fn is_present(params: &Map<String, Value>, name: &str) -> bool {
    match params.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parses an optional positive decimal given as a string or a JSON number.
fn positive_amount(
    params: &Map<String, Value>,
    name: &str,
) -> Result<Option<Decimal>, ResolveError> {
    if !is_present(params, name) {
        return Ok(None);
    }
    let raw = match &params[name] {
        Value::String(s) => s.trim().trim_end_matches('%').trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ResolveError::invalid(
                name,
                format!("{other} is not a number"),
            ));
        }
    };
    let value = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| ResolveError::invalid(name, format!("{raw} is not a number")))?;
    if value <= Decimal::ZERO {
        return Err(ResolveError::invalid(
            name,
            format!("{raw} must be greater than zero"),
        ));
    }
    Ok(Some(value.normalize()))
}
