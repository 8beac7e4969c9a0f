//! Action planning.
//!
//! Turns a validated [`Action`] into approvals plus one router call, with every
//! minimum bounded by the configured slippage tolerance. Planning is pure: the
//! caller supplies the pool snapshot and the account state.

use crate::config::ExecutorConfig;
use crate::context::AccountContext;
use crate::error::PlanError;
use crate::plan::{ExecutionPlan, PlanSummary};
use chrono::Utc;
use nlswap_domain::math::constant_product::{
    apply_slippage, derive_proportional_amount, percent_from_amount, price_impact_bps,
    pro_rata_amount, quote_output, required_liquidity, scale_by, spot_price,
};
use nlswap_domain::token::parse_units;
use nlswap_domain::{
    Action, AddLiquidityParams, MathError, Percentage, PoolSide, PoolSnapshot,
    RemoveLiquidityParams, SwapParams, TokenAmount, WithdrawalIntent,
};
use nlswap_protocols::ContractCall;
use nlswap_protocols::uniswap_v2::router::{
    self, AddLiquidityCallParams, AddLiquidityEthCallParams, RemoveLiquidityCallParams,
    RemoveLiquidityEthCallParams, RouterCalls, SwapCallParams,
};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Symbol of the native asset routed through the `*ETH` entry points.
const NATIVE_SYMBOL: &str = "ETH";

/// Expected result of selling a token into a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub side_in: PoolSide,
    pub amount_in: U256,
    pub expected_out: U256,
    /// `expected_out` less the slippage tolerance, at least one base unit.
    pub min_out: U256,
    pub price_impact_bps: u32,
    /// Pre-trade price of the sold token in units of the bought one.
    pub spot_price: Option<Decimal>,
}

/// Plans router calls for validated actions.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    config: ExecutorConfig,
    router: RouterCalls,
}

impl ActionExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        let router = RouterCalls::new(&config.router_address);
        Self { config, router }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Returns an executor with a different slippage tolerance.
    #[must_use]
    pub fn with_slippage_bps(&self, slippage_bps: u32) -> Self {
        Self::new(self.config.with_slippage_bps(slippage_bps))
    }

    /// Builds the plan for `action` against `pool`.
    ///
    /// # Errors
    /// - [`PlanError::UnknownToken`] if a symbol is not part of the pool
    /// - [`PlanError::Math`] with `InsufficientReserves` when a derived amount
    ///   needs an empty reserve
    /// - [`PlanError::MissingLpPosition`] when removing without LP tokens
    /// - [`PlanError::InvalidAmount`] / [`PlanError::InvalidAction`] for amounts
    ///   that cannot be executed
    pub fn plan(
        &self,
        action: &Action,
        pool: Arc<PoolSnapshot>,
        account: &AccountContext,
    ) -> Result<ExecutionPlan, PlanError> {
        let deadline = account.now.saturating_add(self.config.deadline_secs);
        let (approvals, router_call, summary) = match action {
            Action::Swap(params) => self.plan_swap(params, &pool, account, deadline)?,
            Action::AddLiquidity(params) => {
                self.plan_add_liquidity(params, &pool, account, deadline)?
            }
            Action::RemoveLiquidity(params) => {
                self.plan_remove_liquidity(params, &pool, account, deadline)?
            }
        };

        let plan = ExecutionPlan {
            id: Uuid::new_v4(),
            kind: action.kind(),
            pool,
            approvals,
            router_call,
            summary,
            description: action.to_string(),
            deadline,
            created_at: Utc::now(),
        };
        info!(
            plan_id = %plan.id,
            pool = %plan.pool.address,
            function = %plan.router_call.function,
            approvals = plan.approvals.len(),
            "Built execution plan"
        );
        Ok(plan)
    }

    /// Quotes selling `amount` of `from_symbol` at the pool's current reserves.
    ///
    /// # Errors
    /// - [`PlanError::UnknownToken`] if the symbol is not part of the pool
    /// - [`PlanError::Math`] with `InsufficientReserves` for an empty pool
    /// - [`PlanError::InvalidAmount`] for amounts below one base unit
    pub fn quote(
        &self,
        pool: &PoolSnapshot,
        from_symbol: &str,
        amount: Decimal,
    ) -> Result<SwapQuote, PlanError> {
        let side_in = side_of(pool, from_symbol)?;
        if !pool.is_tradable() {
            return Err(MathError::InsufficientReserves.into());
        }

        let amount_in = base_units(amount, pool.decimals(side_in))?;
        let (reserve_in, reserve_out) = pool.reserves_for(side_in);
        let expected_out = quote_output(amount_in, reserve_in, reserve_out, pool.fee_rate_bps)?;
        let impact = price_impact_bps(amount_in, reserve_in, reserve_out, pool.fee_rate_bps)?;
        let min_out = floor_one(apply_slippage(expected_out, self.config.slippage_bps));
        let side_out = side_in.other();

        Ok(SwapQuote {
            side_in,
            amount_in: amount_in.0,
            expected_out: expected_out.0,
            min_out: min_out.0,
            price_impact_bps: impact,
            spot_price: spot_price(
                reserve_in,
                reserve_out,
                pool.decimals(side_in),
                pool.decimals(side_out),
            ),
        })
    }

    fn plan_swap(
        &self,
        params: &SwapParams,
        pool: &PoolSnapshot,
        account: &AccountContext,
        deadline: u64,
    ) -> Result<(Vec<ContractCall>, ContractCall, PlanSummary), PlanError> {
        let side_in = side_of(pool, &params.from_symbol)?;
        let side_out = side_of(pool, &params.to_symbol)?;
        if side_in == side_out {
            return Err(PlanError::InvalidAction(format!(
                "cannot swap {} for itself",
                params.from_symbol
            )));
        }
        let SwapQuote {
            amount_in,
            expected_out,
            min_out,
            price_impact_bps: impact,
            ..
        } = self.quote(pool, &params.from_symbol, params.amount)?;

        let token_in = pool.token_address(side_in).to_string();
        let token_out = pool.token_address(side_out).to_string();
        let call_params = SwapCallParams {
            amount_in,
            amount_out_min: min_out,
            path: vec![token_in.clone(), token_out],
            to: account.user_address.clone(),
            deadline,
        };

        let mut approvals = Vec::new();
        let router_call = if self.is_native(pool, side_in) {
            self.router.swap_exact_eth_for_tokens(&call_params)
        } else {
            approvals.extend(self.approval_if_needed(&token_in, amount_in, account));
            if self.is_native(pool, side_out) {
                self.router.swap_exact_tokens_for_eth(&call_params)
            } else {
                self.router.swap_exact_tokens_for_tokens(&call_params)
            }
        };

        debug!(
            amount_in = %amount_in,
            expected_out = %expected_out,
            min_out = %min_out,
            impact_bps = impact,
            "Planned swap"
        );

        let summary = PlanSummary::Swap {
            amount_in,
            expected_out,
            min_out,
            price_impact_bps: impact,
            path: call_params.path,
        };
        Ok((approvals, router_call, summary))
    }

    fn plan_add_liquidity(
        &self,
        params: &AddLiquidityParams,
        pool: &PoolSnapshot,
        account: &AccountContext,
        deadline: u64,
    ) -> Result<(Vec<ContractCall>, ContractCall, PlanSummary), PlanError> {
        let (side_a, side_b) = distinct_sides(pool, &params.symbol0, &params.symbol1)?;

        let given_a = params
            .amount0
            .map(|a| base_units(a, pool.decimals(side_a)))
            .transpose()?;
        let given_b = params
            .amount1
            .map(|a| base_units(a, pool.decimals(side_b)))
            .transpose()?;

        // The missing side follows the current reserve ratio.
        let (amount_a, amount_b, derived) = match (given_a, given_b) {
            (Some(a), Some(b)) => (a, b, None),
            (Some(a), None) => {
                let b = derive_proportional_amount(
                    a,
                    TokenAmount(pool.reserve(side_a)),
                    TokenAmount(pool.reserve(side_b)),
                )?;
                (a, b, Some(side_b))
            }
            (None, Some(b)) => {
                let a = derive_proportional_amount(
                    b,
                    TokenAmount(pool.reserve(side_b)),
                    TokenAmount(pool.reserve(side_a)),
                )?;
                (a, b, Some(side_a))
            }
            (None, None) => {
                return Err(PlanError::InvalidAction(
                    "add liquidity needs at least one amount".to_string(),
                ));
            }
        };
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(PlanError::InvalidAmount(
                "deposit rounds to zero on one side".to_string(),
            ));
        }

        let slippage = self.config.slippage_bps;
        let min_a = apply_slippage(amount_a, slippage);
        let min_b = apply_slippage(amount_b, slippage);

        let token_a = pool.token_address(side_a).to_string();
        let token_b = pool.token_address(side_b).to_string();
        let to = account.user_address.clone();

        let mut approvals = Vec::new();
        let native = [side_a, side_b]
            .into_iter()
            .find(|side| self.is_native(pool, *side));
        let router_call = match native {
            Some(eth_side) => {
                let (token, amount_token, min_token, amount_eth, min_eth) = if eth_side == side_a {
                    (&token_b, amount_b, min_b, amount_a, min_a)
                } else {
                    (&token_a, amount_a, min_a, amount_b, min_b)
                };
                approvals.extend(self.approval_if_needed(token, amount_token.0, account));
                self.router.add_liquidity_eth(&AddLiquidityEthCallParams {
                    token: token.clone(),
                    amount_token_desired: amount_token.0,
                    amount_token_min: min_token.0,
                    amount_eth_desired: amount_eth.0,
                    amount_eth_min: min_eth.0,
                    to,
                    deadline,
                })
            }
            None => {
                approvals.extend(self.approval_if_needed(&token_a, amount_a.0, account));
                approvals.extend(self.approval_if_needed(&token_b, amount_b.0, account));
                self.router.add_liquidity(&AddLiquidityCallParams {
                    token_a: token_a.clone(),
                    token_b: token_b.clone(),
                    amount_a_desired: amount_a.0,
                    amount_b_desired: amount_b.0,
                    amount_a_min: min_a.0,
                    amount_b_min: min_b.0,
                    to,
                    deadline,
                })
            }
        };

        let summary = PlanSummary::AddLiquidity {
            amount0_desired: amount_a.0,
            amount1_desired: amount_b.0,
            amount0_min: min_a.0,
            amount1_min: min_b.0,
            derived,
        };
        Ok((approvals, router_call, summary))
    }

    fn plan_remove_liquidity(
        &self,
        params: &RemoveLiquidityParams,
        pool: &PoolSnapshot,
        account: &AccountContext,
        deadline: u64,
    ) -> Result<(Vec<ContractCall>, ContractCall, PlanSummary), PlanError> {
        let (side_a, side_b) = distinct_sides(pool, &params.symbol0, &params.symbol1)?;
        if account.lp_balance.is_zero() {
            return Err(PlanError::MissingLpPosition(pool.pair_label()));
        }
        let balance = TokenAmount(account.lp_balance);
        let supply = TokenAmount(account.lp_total_supply);

        let (liquidity, share) = match params.intent() {
            Some(WithdrawalIntent::Percent(percent)) => {
                let share = Percentage::from_percent(percent).clamped();
                (scale_by(balance, share)?, share)
            }
            Some(WithdrawalIntent::Amount0(amount)) => {
                self.liquidity_for_amount(pool, side_a, amount, balance, supply)?
            }
            Some(WithdrawalIntent::Amount1(amount)) => {
                self.liquidity_for_amount(pool, side_b, amount, balance, supply)?
            }
            None => {
                return Err(PlanError::InvalidAction(
                    "remove liquidity needs a percent or an amount".to_string(),
                ));
            }
        };
        if liquidity.is_zero() {
            return Err(PlanError::InvalidAmount(
                "withdrawal rounds to zero LP tokens".to_string(),
            ));
        }

        let expected_a = pro_rata_amount(liquidity, TokenAmount(pool.reserve(side_a)), supply)?;
        let expected_b = pro_rata_amount(liquidity, TokenAmount(pool.reserve(side_b)), supply)?;
        if expected_a.is_zero() || expected_b.is_zero() {
            warn!(
                pool = %pool.address,
                lp_total_supply = %supply.0,
                "Reserves or LP supply unknown, falling back to minimal withdrawal bounds"
            );
        }
        let slippage = self.config.slippage_bps;
        let min_a = floor_one(apply_slippage(expected_a, slippage));
        let min_b = floor_one(apply_slippage(expected_b, slippage));

        let mut approvals = Vec::new();
        approvals.extend(self.approval_if_needed(&pool.address, liquidity.0, account));

        let token_a = pool.token_address(side_a).to_string();
        let token_b = pool.token_address(side_b).to_string();
        let to = account.user_address.clone();
        let native = [side_a, side_b]
            .into_iter()
            .find(|side| self.is_native(pool, *side));
        let router_call = match native {
            Some(eth_side) => {
                let (token, min_token, min_eth) = if eth_side == side_a {
                    (token_b, min_b, min_a)
                } else {
                    (token_a, min_a, min_b)
                };
                self.router
                    .remove_liquidity_eth(&RemoveLiquidityEthCallParams {
                        token,
                        liquidity: liquidity.0,
                        amount_token_min: min_token.0,
                        amount_eth_min: min_eth.0,
                        to,
                        deadline,
                    })
            }
            None => self.router.remove_liquidity(&RemoveLiquidityCallParams {
                token_a,
                token_b,
                liquidity: liquidity.0,
                amount_a_min: min_a.0,
                amount_b_min: min_b.0,
                to,
                deadline,
            }),
        };

        let summary = PlanSummary::RemoveLiquidity {
            liquidity: liquidity.0,
            percent: share.as_percent(),
            amount0_expected: expected_a.0,
            amount1_expected: expected_b.0,
            amount0_min: min_a.0,
            amount1_min: min_b.0,
        };
        Ok((approvals, router_call, summary))
    }

    /// LP tokens to burn for a token amount, capped at the user's balance.
    fn liquidity_for_amount(
        &self,
        pool: &PoolSnapshot,
        side: PoolSide,
        amount: Decimal,
        balance: TokenAmount,
        supply: TokenAmount,
    ) -> Result<(TokenAmount, Percentage), PlanError> {
        let amount = base_units(amount, pool.decimals(side))?;
        let reserve = TokenAmount(pool.reserve(side));
        let required = required_liquidity(amount, reserve, supply)?;
        let share = percent_from_amount(amount, reserve, supply, balance)?;
        Ok((required.min(balance), share))
    }

    fn approval_if_needed(
        &self,
        token: &str,
        amount: U256,
        account: &AccountContext,
    ) -> Option<ContractCall> {
        let current = account.allowance(token);
        if current >= amount {
            return None;
        }
        debug!(token, allowance = %current, required = %amount, "Approval required");
        Some(router::approve(token, self.router.address(), amount))
    }

    fn is_native(&self, pool: &PoolSnapshot, side: PoolSide) -> bool {
        self.config.weth_address.as_deref().is_some_and(|weth| {
            pool.symbol(side) == NATIVE_SYMBOL && pool.token_address(side).eq_ignore_ascii_case(weth)
        })
    }
}

fn side_of(pool: &PoolSnapshot, symbol: &str) -> Result<PoolSide, PlanError> {
    pool.side_of_symbol(symbol)
        .ok_or_else(|| PlanError::UnknownToken {
            symbol: symbol.to_string(),
            pair: pool.pair_label(),
        })
}

fn distinct_sides(
    pool: &PoolSnapshot,
    symbol0: &str,
    symbol1: &str,
) -> Result<(PoolSide, PoolSide), PlanError> {
    let side_a = side_of(pool, symbol0)?;
    let side_b = side_of(pool, symbol1)?;
    if side_a == side_b {
        return Err(PlanError::InvalidAction(format!(
            "both sides name {symbol0}"
        )));
    }
    Ok((side_a, side_b))
}

fn base_units(amount: Decimal, decimals: u8) -> Result<TokenAmount, PlanError> {
    let units = parse_units(amount, decimals)?;
    if units.is_zero() {
        return Err(PlanError::InvalidAmount(format!(
            "{amount} is below the smallest unit"
        )));
    }
    Ok(TokenAmount(units))
}

/// Lifts a zero minimum to one base unit.
fn floor_one(amount: TokenAmount) -> TokenAmount {
    if amount.is_zero() {
        TokenAmount(U256::one())
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlswap_protocols::AbiValue;
    use rust_decimal_macros::dec;

    const PAIR: &str = "0x1234567890123456789012345678901234567890";
    const WETH: &str = "0x0000000000000000000000000000000000000001";
    const USDC: &str = "0x0000000000000000000000000000000000000002";
    const USER: &str = "0x00000000000000000000000000000000000000aa";
    const NOW: u64 = 1_700_000_000;

    fn eth_usdc() -> Arc<PoolSnapshot> {
        Arc::new(PoolSnapshot::from_symbols(
            PAIR,
            (WETH, "ETH"),
            (USDC, "USDC"),
            U256::from(10u64) * U256::exp10(18),
            U256::from(20_000u64) * U256::exp10(6),
        ))
    }

    fn executor() -> ActionExecutor {
        ActionExecutor::new(ExecutorConfig::default())
    }

    fn native_executor() -> ActionExecutor {
        ActionExecutor::new(ExecutorConfig {
            weth_address: Some(WETH.to_string()),
            ..ExecutorConfig::default()
        })
    }

    #[test]
    fn test_quote_reverse_direction() {
        let quote = executor().quote(&eth_usdc(), "usdc", dec!(100)).unwrap();
        assert_eq!(quote.side_in, PoolSide::Token1);
        assert_eq!(quote.amount_in, U256::from(100_000_000u64));
        // 100e6 * 997 * 10e18 / (20000e6 * 1000 + 100e6 * 997)
        assert_eq!(quote.expected_out, U256::from(49_602_730_389_010_781u64));
        assert!(quote.min_out < quote.expected_out);
        assert!(quote.price_impact_bps >= 30);
        assert_eq!(quote.spot_price, Some(dec!(0.0005)));
    }

    #[test]
    fn test_quote_rejects_dust_and_empty_pool() {
        assert!(matches!(
            executor().quote(&eth_usdc(), "USDC", dec!(0.0000001)),
            Err(PlanError::InvalidAmount(_))
        ));
        let empty = eth_usdc().with_reserves(U256::zero(), U256::zero());
        assert_eq!(
            executor().quote(&empty, "ETH", dec!(1)),
            Err(PlanError::Math(MathError::InsufficientReserves))
        );
    }

    fn swap(from: &str, to: &str, amount: Decimal) -> Action {
        Action::Swap(SwapParams {
            from_symbol: from.into(),
            to_symbol: to.into(),
            amount,
        })
    }

    fn remove(percent: Option<Decimal>, amount1: Option<Decimal>) -> Action {
        Action::RemoveLiquidity(RemoveLiquidityParams {
            symbol0: "ETH".into(),
            symbol1: "USDC".into(),
            percent,
            amount0: None,
            amount1,
        })
    }

    fn lp_account() -> AccountContext {
        AccountContext::new(USER, NOW).with_lp_position(
            U256::from(2u64) * U256::exp10(18),
            U256::from(100u64) * U256::exp10(18),
        )
    }

    #[test]
    fn test_swap_eth_for_usdc() {
        let plan = executor()
            .plan(&swap("ETH", "USDC", dec!(0.1)), eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();

        match &plan.summary {
            PlanSummary::Swap {
                amount_in,
                expected_out,
                min_out,
                path,
                ..
            } => {
                assert_eq!(*amount_in, U256::exp10(17));
                assert_eq!(*expected_out, U256::from(197_431_606u64));
                assert_eq!(*min_out, U256::from(187_560_025u64));
                assert_eq!(path, &vec![WETH.to_string(), USDC.to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(plan.approvals.len(), 1);
        assert_eq!(plan.approvals[0].function, "approve");
        assert_eq!(plan.approvals[0].address, WETH);
        assert_eq!(
            plan.router_call.function,
            "swapExactTokensForTokensSupportingFeeOnTransferTokens"
        );
        assert_eq!(plan.router_call.args[4], AbiValue::uint(NOW + 1200));
        assert_eq!(plan.deadline, NOW + 1200);
        assert_eq!(plan.description, "Swap 0.1 ETH for USDC");
        assert_eq!(plan.call_count(), 2);
    }

    #[test]
    fn test_swap_skips_sufficient_allowance() {
        let account = AccountContext::new(USER, NOW).with_allowance(USDC, U256::MAX);
        let plan = executor()
            .plan(&swap("usdc", "eth", dec!(100)), eth_usdc(), &account)
            .unwrap();
        assert!(plan.approvals.is_empty());
        assert_eq!(plan.calls().count(), 1);
    }

    #[test]
    fn test_swap_native_eth_sends_value() {
        let plan = native_executor()
            .plan(&swap("ETH", "USDC", dec!(0.1)), eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();
        assert!(plan.approvals.is_empty());
        assert_eq!(
            plan.router_call.function,
            "swapExactETHForTokensSupportingFeeOnTransferTokens"
        );
        assert_eq!(plan.router_call.value, Some(U256::exp10(17)));

        let plan = native_executor()
            .plan(&swap("USDC", "ETH", dec!(100)), eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();
        assert_eq!(plan.approvals.len(), 1);
        assert_eq!(
            plan.router_call.function,
            "swapExactTokensForETHSupportingFeeOnTransferTokens"
        );
    }

    #[test]
    fn test_swap_against_empty_pool() {
        let pool = Arc::new(eth_usdc().with_reserves(U256::zero(), U256::exp10(6)));
        assert_eq!(
            executor()
                .plan(&swap("ETH", "USDC", dec!(0.1)), pool, &AccountContext::new(USER, NOW))
                .unwrap_err(),
            PlanError::Math(MathError::InsufficientReserves)
        );
    }

    #[test]
    fn test_dust_swap_keeps_nonzero_minimum() {
        let plan = executor()
            .plan(
                &swap("USDC", "ETH", dec!(0.000001)),
                Arc::new(eth_usdc().with_reserves(U256::from(10u64), U256::exp10(12))),
                &AccountContext::new(USER, NOW),
            )
            .unwrap();
        match plan.summary {
            PlanSummary::Swap { min_out, .. } => assert_eq!(min_out, U256::one()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_swap_unknown_token() {
        assert!(matches!(
            executor().plan(&swap("ETH", "WBTC", dec!(1)), eth_usdc(), &AccountContext::new(USER, NOW)),
            Err(PlanError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_add_liquidity_derives_missing_side() {
        let action = Action::AddLiquidity(AddLiquidityParams {
            symbol0: "ETH".into(),
            symbol1: "USDC".into(),
            amount0: Some(dec!(0.5)),
            amount1: None,
        });
        let plan = executor()
            .plan(&action, eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();

        match &plan.summary {
            PlanSummary::AddLiquidity {
                amount0_desired,
                amount1_desired,
                amount0_min,
                derived,
                ..
            } => {
                assert_eq!(*amount0_desired, U256::from(5u64) * U256::exp10(17));
                assert_eq!(*amount1_desired, U256::from(1000u64) * U256::exp10(6));
                assert_eq!(*amount0_min, U256::from(475u64) * U256::exp10(15));
                assert_eq!(*derived, Some(PoolSide::Token1));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(plan.approvals.len(), 2);
        assert_eq!(plan.router_call.function, "addLiquidity");
    }

    #[test]
    fn test_add_liquidity_reversed_symbols() {
        let action = Action::AddLiquidity(AddLiquidityParams {
            symbol0: "USDC".into(),
            symbol1: "ETH".into(),
            amount0: Some(dec!(2000)),
            amount1: None,
        });
        let plan = executor()
            .plan(&action, eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();
        match plan.summary {
            PlanSummary::AddLiquidity { amount1_desired, .. } => {
                assert_eq!(amount1_desired, U256::exp10(18));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(plan.router_call.args[0], AbiValue::address(USDC));
    }

    #[test]
    fn test_add_liquidity_native_eth() {
        let action = Action::AddLiquidity(AddLiquidityParams {
            symbol0: "ETH".into(),
            symbol1: "USDC".into(),
            amount0: Some(dec!(0.5)),
            amount1: Some(dec!(1000)),
        });
        let plan = native_executor()
            .plan(&action, eth_usdc(), &AccountContext::new(USER, NOW))
            .unwrap();
        assert_eq!(plan.router_call.function, "addLiquidityETH");
        assert_eq!(plan.router_call.value, Some(U256::from(5u64) * U256::exp10(17)));
        assert_eq!(plan.approvals.len(), 1);
        assert_eq!(plan.approvals[0].address, USDC);
    }

    #[test]
    fn test_add_liquidity_to_empty_pool_needs_both_amounts() {
        let pool = Arc::new(eth_usdc().with_reserves(U256::zero(), U256::zero()));
        let action = Action::AddLiquidity(AddLiquidityParams {
            symbol0: "ETH".into(),
            symbol1: "USDC".into(),
            amount0: Some(dec!(0.5)),
            amount1: None,
        });
        assert_eq!(
            executor()
                .plan(&action, pool, &AccountContext::new(USER, NOW))
                .unwrap_err(),
            PlanError::Math(MathError::InsufficientReserves)
        );
    }

    #[test]
    fn test_remove_half_of_position() {
        let plan = executor()
            .plan(&remove(Some(dec!(50)), None), eth_usdc(), &lp_account())
            .unwrap();
        match &plan.summary {
            PlanSummary::RemoveLiquidity {
                liquidity,
                percent,
                amount0_expected,
                amount0_min,
                amount1_expected,
                ..
            } => {
                assert_eq!(*liquidity, U256::exp10(18));
                assert_eq!(*percent, dec!(50));
                assert_eq!(*amount0_expected, U256::exp10(17));
                assert_eq!(*amount0_min, U256::from(95u64) * U256::exp10(15));
                assert_eq!(*amount1_expected, U256::from(200u64) * U256::exp10(6));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(plan.approvals.len(), 1);
        assert_eq!(plan.approvals[0].address, PAIR);
        assert_eq!(plan.router_call.function, "removeLiquidity");
    }

    #[test]
    fn test_remove_by_amount_is_capped_at_balance() {
        // 1000 USDC needs 5 LP tokens, the user holds 2.
        let plan = executor()
            .plan(&remove(None, Some(dec!(1000))), eth_usdc(), &lp_account())
            .unwrap();
        match plan.summary {
            PlanSummary::RemoveLiquidity { liquidity, percent, .. } => {
                assert_eq!(liquidity, U256::from(2u64) * U256::exp10(18));
                assert_eq!(percent, dec!(100));
            }
            other => panic!("unexpected {other:?}"),
        }

        // 100 USDC needs 0.5 LP tokens.
        let plan = executor()
            .plan(&remove(None, Some(dec!(100))), eth_usdc(), &lp_account())
            .unwrap();
        match plan.summary {
            PlanSummary::RemoveLiquidity { liquidity, percent, .. } => {
                assert_eq!(liquidity, U256::from(5u64) * U256::exp10(17));
                assert_eq!(percent, dec!(25));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_remove_without_supply_falls_back_to_unit_minimums() {
        let account = AccountContext::new(USER, NOW)
            .with_lp_position(U256::exp10(18), U256::zero())
            .with_allowance(PAIR, U256::MAX);
        let plan = executor()
            .plan(&remove(Some(dec!(100)), None), eth_usdc(), &account)
            .unwrap();
        assert!(plan.approvals.is_empty());
        match plan.summary {
            PlanSummary::RemoveLiquidity {
                amount0_min,
                amount1_min,
                ..
            } => {
                assert_eq!(amount0_min, U256::one());
                assert_eq!(amount1_min, U256::one());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_remove_without_position() {
        assert_eq!(
            executor()
                .plan(&remove(Some(dec!(50)), None), eth_usdc(), &AccountContext::new(USER, NOW))
                .unwrap_err(),
            PlanError::MissingLpPosition("ETH/USDC".into())
        );
    }

    #[test]
    fn test_remove_native_eth() {
        let plan = native_executor()
            .plan(&remove(Some(dec!(25)), None), eth_usdc(), &lp_account())
            .unwrap();
        assert_eq!(plan.router_call.function, "removeLiquidityETH");
        assert_eq!(plan.router_call.args[0], AbiValue::address(USDC));
        assert_eq!(plan.router_call.value, None);
    }

    #[test]
    fn test_plans_are_fresh() {
        let action = swap("ETH", "USDC", dec!(0.1));
        let account = AccountContext::new(USER, NOW);
        let first = executor().plan(&action, eth_usdc(), &account).unwrap();
        let second = executor().plan(&action, eth_usdc(), &account).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.router_call, second.router_call);
    }
}
