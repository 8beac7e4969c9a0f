//! Execution plans: the ledger calls derived from one action.

use chrono::{DateTime, Utc};
use nlswap_domain::{ActionKind, PoolSide, PoolSnapshot, serde_u256};
use nlswap_protocols::ContractCall;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Amounts the plan was built from, in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlanSummary {
    Swap {
        #[serde(with = "serde_u256")]
        amount_in: U256,
        #[serde(with = "serde_u256")]
        expected_out: U256,
        #[serde(with = "serde_u256")]
        min_out: U256,
        price_impact_bps: u32,
        path: Vec<String>,
    },
    AddLiquidity {
        #[serde(with = "serde_u256")]
        amount0_desired: U256,
        #[serde(with = "serde_u256")]
        amount1_desired: U256,
        #[serde(with = "serde_u256")]
        amount0_min: U256,
        #[serde(with = "serde_u256")]
        amount1_min: U256,
        /// Side whose amount was derived from the reserve ratio, if any.
        derived: Option<PoolSide>,
    },
    RemoveLiquidity {
        #[serde(with = "serde_u256")]
        liquidity: U256,
        /// Share of the user's LP balance on the 0-100 scale.
        percent: Decimal,
        #[serde(with = "serde_u256")]
        amount0_expected: U256,
        #[serde(with = "serde_u256")]
        amount1_expected: U256,
        #[serde(with = "serde_u256")]
        amount0_min: U256,
        #[serde(with = "serde_u256")]
        amount1_min: U256,
    },
}

/// Approvals followed by exactly one router call.
///
/// A plan captures the pool snapshot it was derived from and is never rebased
/// onto a newer one. Build a fresh plan for every confirmation.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub id: Uuid,
    pub kind: ActionKind,
    pub pool: Arc<PoolSnapshot>,
    pub approvals: Vec<ContractCall>,
    pub router_call: ContractCall,
    pub summary: PlanSummary,
    /// One-line description of the action.
    pub description: String,
    /// Unix deadline carried by the router call.
    pub deadline: u64,
    pub created_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// All calls in submission order.
    pub fn calls(&self) -> impl Iterator<Item = &ContractCall> {
        self.approvals.iter().chain(std::iter::once(&self.router_call))
    }

    /// Number of ledger calls in the plan.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.approvals.len() + 1
    }
}
