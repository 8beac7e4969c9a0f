//! Per-user chain state needed to plan an action.

use nlswap_domain::PoolSnapshot;
use nlswap_protocols::uniswap_v2::router;
use nlswap_protocols::{AbiValue, ContractCall, ContractReader, LedgerError};
use primitive_types::U256;
use std::collections::HashMap;
use tracing::debug;

/// Allowances and LP position of one user against one pool.
///
/// Read by the calling layer before planning; the planner never reads the
/// ledger itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub user_address: String,
    /// Router allowance per token address (lowercase), including the LP token.
    pub allowances: HashMap<String, U256>,
    pub lp_balance: U256,
    pub lp_total_supply: U256,
    /// Unix seconds used as the base of router deadlines.
    pub now: u64,
}

impl AccountContext {
    pub fn new(user_address: impl Into<String>, now: u64) -> Self {
        Self {
            user_address: user_address.into(),
            allowances: HashMap::new(),
            lp_balance: U256::zero(),
            lp_total_supply: U256::zero(),
            now,
        }
    }

    #[must_use]
    pub fn with_allowance(mut self, token: &str, amount: U256) -> Self {
        self.allowances.insert(token.to_ascii_lowercase(), amount);
        self
    }

    #[must_use]
    pub fn with_lp_position(mut self, balance: U256, total_supply: U256) -> Self {
        self.lp_balance = balance;
        self.lp_total_supply = total_supply;
        self
    }

    /// Router allowance for `token`; unknown tokens have none.
    #[must_use]
    pub fn allowance(&self, token: &str) -> U256 {
        self.allowances
            .get(&token.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }
}

/// Reads the user's router allowances for both pool tokens and the LP token,
/// plus LP balance and total supply.
///
/// A token that reverts on a read counts as zero; transport failures propagate.
///
/// # Errors
/// Returns a [`LedgerError`] if the ledger cannot be reached.
pub async fn gather_account_context(
    reader: &dyn ContractReader,
    pool: &PoolSnapshot,
    user: &str,
    spender: &str,
    now: u64,
) -> Result<AccountContext, LedgerError> {
    let (allowance0, allowance1, lp_allowance, lp_balance, lp_total_supply) = tokio::try_join!(
        read_uint(reader, router::allowance(&pool.token0, user, spender)),
        read_uint(reader, router::allowance(&pool.token1, user, spender)),
        read_uint(reader, router::allowance(&pool.address, user, spender)),
        read_uint(reader, router::balance_of(&pool.address, user)),
        read_uint(reader, router::total_supply(&pool.address)),
    )?;

    debug!(
        pool = %pool.address,
        user,
        lp_balance = %lp_balance,
        lp_total_supply = %lp_total_supply,
        "Gathered account context"
    );

    Ok(AccountContext::new(user, now)
        .with_allowance(&pool.token0, allowance0)
        .with_allowance(&pool.token1, allowance1)
        .with_allowance(&pool.address, lp_allowance)
        .with_lp_position(lp_balance, lp_total_supply))
}

async fn read_uint(reader: &dyn ContractReader, call: ContractCall) -> Result<U256, LedgerError> {
    match reader.read_contract(&call).await {
        Ok(outputs) => Ok(outputs
            .first()
            .and_then(AbiValue::as_u256)
            .unwrap_or_default()),
        Err(LedgerError::Reverted(reason)) => {
            debug!(function = %call.function, address = %call.address, %reason, "Read reverted, using zero");
            Ok(U256::zero())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlswap_protocols::memory::InMemoryLedger;

    const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    const USER: &str = "0x00000000000000000000000000000000000000AA";

    fn pool() -> PoolSnapshot {
        PoolSnapshot::from_symbols(
            "0x1234567890123456789012345678901234567890",
            ("0x0000000000000000000000000000000000000001", "ETH"),
            ("0x0000000000000000000000000000000000000002", "USDC"),
            U256::from(10u64) * U256::exp10(18),
            U256::from(20_000u64) * U256::exp10(6),
        )
    }

    #[tokio::test]
    async fn test_gathers_allowances_and_lp_position() {
        let pool = pool();
        let ledger = InMemoryLedger::new();
        ledger.seed_pool(&pool, U256::from(100u64) * U256::exp10(18));
        ledger.set_allowance(&pool.token0, USER, ROUTER, U256::MAX);
        ledger.set_balance(&pool.address, USER, U256::from(2u64) * U256::exp10(18));

        let ctx = gather_account_context(&ledger, &pool, USER, ROUTER, 1_700_000_000)
            .await
            .unwrap();
        assert_eq!(ctx.allowance(&pool.token0), U256::MAX);
        assert_eq!(ctx.allowance(&pool.token1), U256::zero());
        assert_eq!(ctx.allowance(&pool.address), U256::zero());
        assert_eq!(ctx.lp_balance, U256::from(2u64) * U256::exp10(18));
        assert_eq!(ctx.lp_total_supply, U256::from(100u64) * U256::exp10(18));
        assert_eq!(ctx.now, 1_700_000_000);
    }

    #[test]
    fn test_allowance_lookup_ignores_case() {
        let ctx = AccountContext::new(USER, 0)
            .with_allowance("0xABCDEF0000000000000000000000000000000001", U256::one());
        assert_eq!(
            ctx.allowance("0xabcdef0000000000000000000000000000000001"),
            U256::one()
        );
    }
}
