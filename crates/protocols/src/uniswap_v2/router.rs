//! Uniswap V2 router call builders.
//!
//! Each builder produces a [`ContractCall`] against the router; nothing here
//! talks to the chain.

use crate::ledger::{AbiValue, ContractCall};
use primitive_types::U256;

/// Parameters shared by the exact-input swap entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCallParams {
    /// Input amount in base units (sent as `value` for the ETH-in variant).
    pub amount_in: U256,
    /// Minimum acceptable output.
    pub amount_out_min: U256,
    /// Token path, input first.
    pub path: Vec<String>,
    /// Recipient of the output tokens.
    pub to: String,
    /// Unix deadline enforced by the router.
    pub deadline: u64,
}

/// Parameters for `addLiquidity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityCallParams {
    pub token_a: String,
    pub token_b: String,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: String,
    pub deadline: u64,
}

/// Parameters for `addLiquidityETH`; the ETH side travels as `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityEthCallParams {
    pub token: String,
    pub amount_token_desired: U256,
    pub amount_token_min: U256,
    pub amount_eth_desired: U256,
    pub amount_eth_min: U256,
    pub to: String,
    pub deadline: u64,
}

/// Parameters for `removeLiquidity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityCallParams {
    pub token_a: String,
    pub token_b: String,
    /// LP tokens to burn.
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: String,
    pub deadline: u64,
}

/// Parameters for `removeLiquidityETH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityEthCallParams {
    pub token: String,
    pub liquidity: U256,
    pub amount_token_min: U256,
    pub amount_eth_min: U256,
    pub to: String,
    pub deadline: u64,
}

/// Builds calls against one deployed router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterCalls {
    router: String,
}

impl RouterCalls {
    pub fn new(router: impl Into<String>) -> Self {
        Self {
            router: router.into(),
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.router
    }

    /// `swapExactTokensForTokensSupportingFeeOnTransferTokens`.
    ///
    /// Preferred over the plain variant since it checks the recipient's balance
    /// delta instead of assuming the nominal amount arrived.
    pub fn swap_exact_tokens_for_tokens(&self, params: &SwapCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "swapExactTokensForTokensSupportingFeeOnTransferTokens",
            vec![
                AbiValue::Uint(params.amount_in),
                AbiValue::Uint(params.amount_out_min),
                AbiValue::AddressArray(params.path.clone()),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
    }

    /// `swapExactETHForTokensSupportingFeeOnTransferTokens`, paying `amount_in` as value.
    pub fn swap_exact_eth_for_tokens(&self, params: &SwapCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "swapExactETHForTokensSupportingFeeOnTransferTokens",
            vec![
                AbiValue::Uint(params.amount_out_min),
                AbiValue::AddressArray(params.path.clone()),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
        .with_value(params.amount_in)
    }

    /// `swapExactTokensForETHSupportingFeeOnTransferTokens`.
    pub fn swap_exact_tokens_for_eth(&self, params: &SwapCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "swapExactTokensForETHSupportingFeeOnTransferTokens",
            vec![
                AbiValue::Uint(params.amount_in),
                AbiValue::Uint(params.amount_out_min),
                AbiValue::AddressArray(params.path.clone()),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
    }

    pub fn add_liquidity(&self, params: &AddLiquidityCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "addLiquidity",
            vec![
                AbiValue::address(&params.token_a),
                AbiValue::address(&params.token_b),
                AbiValue::Uint(params.amount_a_desired),
                AbiValue::Uint(params.amount_b_desired),
                AbiValue::Uint(params.amount_a_min),
                AbiValue::Uint(params.amount_b_min),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
    }

    pub fn add_liquidity_eth(&self, params: &AddLiquidityEthCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "addLiquidityETH",
            vec![
                AbiValue::address(&params.token),
                AbiValue::Uint(params.amount_token_desired),
                AbiValue::Uint(params.amount_token_min),
                AbiValue::Uint(params.amount_eth_min),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
        .with_value(params.amount_eth_desired)
    }

    pub fn remove_liquidity(&self, params: &RemoveLiquidityCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "removeLiquidity",
            vec![
                AbiValue::address(&params.token_a),
                AbiValue::address(&params.token_b),
                AbiValue::Uint(params.liquidity),
                AbiValue::Uint(params.amount_a_min),
                AbiValue::Uint(params.amount_b_min),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
    }

    pub fn remove_liquidity_eth(&self, params: &RemoveLiquidityEthCallParams) -> ContractCall {
        ContractCall::new(
            &self.router,
            "removeLiquidityETH",
            vec![
                AbiValue::address(&params.token),
                AbiValue::Uint(params.liquidity),
                AbiValue::Uint(params.amount_token_min),
                AbiValue::Uint(params.amount_eth_min),
                AbiValue::address(&params.to),
                AbiValue::uint(params.deadline),
            ],
        )
    }
}

/// ERC-20 `approve(spender, amount)` on `token`.
pub fn approve(token: &str, spender: &str, amount: U256) -> ContractCall {
    ContractCall::new(
        token,
        "approve",
        vec![AbiValue::address(spender), AbiValue::Uint(amount)],
    )
}

/// ERC-20 `allowance(owner, spender)` on `token`.
pub fn allowance(token: &str, owner: &str, spender: &str) -> ContractCall {
    ContractCall::new(
        token,
        "allowance",
        vec![AbiValue::address(owner), AbiValue::address(spender)],
    )
}

/// ERC-20 `balanceOf(owner)` on `token`.
pub fn balance_of(token: &str, owner: &str) -> ContractCall {
    ContractCall::new(token, "balanceOf", vec![AbiValue::address(owner)])
}

/// ERC-20 `totalSupply()` on `token`.
pub fn total_supply(token: &str) -> ContractCall {
    ContractCall::new(token, "totalSupply", vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const USER: &str = "0x00000000000000000000000000000000000000aa";

    fn swap_params() -> SwapCallParams {
        SwapCallParams {
            amount_in: U256::exp10(17),
            amount_out_min: U256::from(187_560_025u64),
            path: vec![WETH.into(), USDC.into()],
            to: USER.into(),
            deadline: 1_700_001_200,
        }
    }

    #[test]
    fn test_token_swap_uses_fee_on_transfer_variant() {
        let router = RouterCalls::new(ROUTER);
        let call = router.swap_exact_tokens_for_tokens(&swap_params());
        assert_eq!(call.address, ROUTER);
        assert_eq!(call.value, None);
        assert!(call.calldata_hex().unwrap().starts_with("0x5c11d795"));
    }

    #[test]
    fn test_eth_swap_sends_value() {
        let router = RouterCalls::new(ROUTER);
        let call = router.swap_exact_eth_for_tokens(&swap_params());
        assert_eq!(call.value, Some(U256::exp10(17)));
        assert_eq!(call.args.len(), 4);
        assert!(call.calldata_hex().unwrap().starts_with("0xb6f9de95"));
    }

    #[test]
    fn test_liquidity_calls_encode() {
        let router = RouterCalls::new(ROUTER);
        let add = router.add_liquidity(&AddLiquidityCallParams {
            token_a: WETH.into(),
            token_b: USDC.into(),
            amount_a_desired: U256::exp10(18),
            amount_b_desired: U256::from(2_000_000_000u64),
            amount_a_min: U256::zero(),
            amount_b_min: U256::zero(),
            to: USER.into(),
            deadline: 1,
        });
        // Selector plus eight static words.
        assert_eq!(add.calldata().unwrap().len(), 4 + 8 * 32);

        let remove = router.remove_liquidity_eth(&RemoveLiquidityEthCallParams {
            token: USDC.into(),
            liquidity: U256::one(),
            amount_token_min: U256::one(),
            amount_eth_min: U256::one(),
            to: USER.into(),
            deadline: 1,
        });
        assert!(remove.calldata_hex().unwrap().starts_with("0x02751cec"));
    }

    #[test]
    fn test_approve_targets_token() {
        let call = approve(USDC, ROUTER, U256::MAX);
        assert_eq!(call.address, USDC);
        assert_eq!(call.args[0], AbiValue::address(ROUTER));
        assert!(call.calldata_hex().unwrap().starts_with("0x095ea7b3"));
    }
}
