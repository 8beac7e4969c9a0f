//! Request and response bodies.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use nlswap_domain::{Action, ActionKind, PoolSnapshot, serde_u256};
use nlswap_execution::{ExecutionPlan, PlanSummary};
use nlswap_protocols::{AbiValue, ContractCall};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pool context sent by the browser with an instruction.
///
/// Only the symbols are required for resolution; decimals fall back to the
/// symbol registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolContext {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub token0: String,
    #[serde(default)]
    pub token1: String,
    pub token0_symbol: String,
    pub token1_symbol: String,
    #[serde(default, with = "serde_u256::option")]
    pub reserve0: Option<U256>,
    #[serde(default, with = "serde_u256::option")]
    pub reserve1: Option<U256>,
    #[serde(default, alias = "token0Decimals")]
    pub decimals0: Option<u8>,
    #[serde(default, alias = "token1Decimals")]
    pub decimals1: Option<u8>,
}

impl From<PoolContext> for PoolSnapshot {
    fn from(ctx: PoolContext) -> Self {
        let mut pool = PoolSnapshot::from_symbols(
            ctx.address,
            (ctx.token0.as_str(), ctx.token0_symbol.as_str()),
            (ctx.token1.as_str(), ctx.token1_symbol.as_str()),
            ctx.reserve0.unwrap_or_default(),
            ctx.reserve1.unwrap_or_default(),
        );
        if let Some(decimals) = ctx.decimals0 {
            pool.decimals0 = decimals;
        }
        if let Some(decimals) = ctx.decimals1 {
            pool.decimals1 = decimals;
        }
        pool
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveActionRequest {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub pool: Option<PoolContext>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub custom_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveActionResponse {
    pub success: bool,
    pub action: Action,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairAddressQuery {
    pub index: Option<String>,
    pub factory: Option<String>,
    pub token0: Option<String>,
    pub token1: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairQuery {
    pub pair: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapHistoryQuery {
    pub pair: Option<String>,
    pub days: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteQuery {
    pub pair: Option<String>,
    pub from: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub pair: String,
    pub from_token: String,
    pub to_token: String,
    #[serde(with = "serde_u256")]
    pub amount_in: U256,
    #[serde(with = "serde_u256")]
    pub expected_out: U256,
    #[serde(with = "serde_u256")]
    pub min_out: U256,
    /// `expected_out` in whole units of the output token.
    pub expected_out_formatted: String,
    /// Pre-trade price of `from_token` in `to_token`.
    pub spot_price: Option<Decimal>,
    pub price_impact_bps: u32,
    pub slippage_bps: u32,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub pair_label: String,
    #[serde(flatten)]
    pub pool: PoolSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanActionRequest {
    pub action: Action,
    pub pair: String,
    pub user_address: String,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
}

/// A ledger call ready for a wallet to sign.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEntry {
    pub to: String,
    pub function: String,
    pub args: Vec<AbiValue>,
    #[serde(with = "serde_u256::option", skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// ABI-encoded calldata, `0x`-prefixed.
    pub data: String,
}

impl TryFrom<&ContractCall> for CallEntry {
    type Error = ApiError;

    fn try_from(call: &ContractCall) -> Result<Self, Self::Error> {
        Ok(Self {
            to: call.address.clone(),
            function: call.function.clone(),
            args: call.args.clone(),
            value: call.value,
            data: call.calldata_hex()?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: Uuid,
    pub kind: ActionKind,
    pub pair: String,
    pub description: String,
    pub deadline: u64,
    pub created_at: DateTime<Utc>,
    pub summary: PlanSummary,
    /// Approvals first, router call last.
    pub calls: Vec<CallEntry>,
}

impl TryFrom<&ExecutionPlan> for PlanResponse {
    type Error = ApiError;

    fn try_from(plan: &ExecutionPlan) -> Result<Self, Self::Error> {
        Ok(Self {
            id: plan.id,
            kind: plan.kind,
            pair: plan.pool.address.clone(),
            description: plan.description.clone(),
            deadline: plan.deadline,
            created_at: plan.created_at,
            summary: plan.summary.clone(),
            calls: plan
                .calls()
                .map(CallEntry::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_context_fills_decimals() {
        let ctx: PoolContext = serde_json::from_value(serde_json::json!({
            "address": "0x1234567890123456789012345678901234567890",
            "token0Symbol": "WBTC",
            "token1Symbol": "ETH",
            "reserve0": "200000000",
            "reserve1": 60000000000000000000u128.to_string(),
            "token1Decimals": 18
        }))
        .unwrap();
        let pool = PoolSnapshot::from(ctx);
        assert_eq!(pool.decimals0, 8);
        assert_eq!(pool.decimals1, 18);
        assert_eq!(pool.reserve0, U256::from(200_000_000u64));
        assert_eq!(pool.pair_label(), "WBTC/ETH");
    }

    #[test]
    fn test_pool_context_symbols_only() {
        let ctx: PoolContext = serde_json::from_str(r#"{"token0Symbol":"ETH","token1Symbol":"USDC"}"#)
            .unwrap();
        let pool = PoolSnapshot::from(ctx);
        assert_eq!(pool.decimals1, 6);
        assert!(pool.reserve0.is_zero());
    }
}
