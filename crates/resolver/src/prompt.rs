//! System prompt construction.

use nlswap_domain::PoolSnapshot;
use nlswap_domain::token::format_units;

/// Builds the system prompt for `pool`.
///
/// The prompt lists the three callable shapes, grounds the model in the pool's
/// actual tokens and reserves, and asks for a single JSON object.
pub fn build_system_prompt(pool: &PoolSnapshot) -> String {
    let t0 = &pool.token0_symbol;
    let t1 = &pool.token1_symbol;
    format!(
        r#"You convert natural-language instructions into structured actions for a Uniswap V2 style exchange.
The following functions are available:

1. swap(fromToken, toToken, amount)
   - fromToken: symbol of the token to sell, "{t0}" or "{t1}"
   - toToken: symbol of the token to buy, "{t0}" or "{t1}"
   - amount: amount of fromToken to sell, as a decimal string (e.g. "0.1")

2. addLiquidity(token0, token1, amount0, amount1)
   - token0, token1: the two token symbols of the pool
   - amount0: amount of token0 to deposit (omit if the user did not give it)
   - amount1: amount of token1 to deposit (omit if the user did not give it)
   At least one amount is required. Never guess the missing amount; it is derived from the pool ratio.

3. removeLiquidity(token0, token1, percent, amount0, amount1)
   - token0, token1: the two token symbols of the pool
   - percent: share of the user's liquidity to withdraw, 0-100 (e.g. "50"; "all" means "100")
   - amount0 / amount1: amount of token0 / token1 the user wants back, only when no percentage is given
   Give exactly one of percent, amount0 or amount1.

Current pool:
- Pool address: {address}
- Token0: {t0} ({token0}), {decimals0} decimals
- Token1: {t1} ({token1}), {decimals1} decimals
- Reserve0: {reserve0} ({reserve0_human} {t0})
- Reserve1: {reserve1} ({reserve1_human} {t1})

Only tokens of this pool may appear in the parameters. Use the symbols exactly as written above.

Respond with a single JSON object and nothing else:
{{"function": "swap" | "addLiquidity" | "removeLiquidity", "parameters": {{ ... }}}}

If the instruction is unclear, mentions a token outside this pool, or does not map to one of these functions, respond with:
{{"error": "explanation of the problem"}}"#,
        address = pool.address,
        token0 = pool.token0,
        token1 = pool.token1,
        decimals0 = pool.decimals0,
        decimals1 = pool.decimals1,
        reserve0 = pool.reserve0,
        reserve1 = pool.reserve1,
        reserve0_human = format_units(pool.reserve0, pool.decimals0),
        reserve1_human = format_units(pool.reserve1, pool.decimals1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[test]
    fn test_prompt_grounds_pool_tokens() {
        let pool = PoolSnapshot::from_symbols(
            "0x1234567890123456789012345678901234567890",
            ("0x0000000000000000000000000000000000000001", "ETH"),
            ("0x0000000000000000000000000000000000000002", "USDC"),
            U256::from(10u64) * U256::exp10(18),
            U256::from(20_000u64) * U256::exp10(6),
        );
        let prompt = build_system_prompt(&pool);
        assert!(prompt.contains("Token0: ETH (0x0000000000000000000000000000000000000001)"));
        assert!(prompt.contains("Reserve1: 20000000000 (20000 USDC)"));
        assert!(prompt.contains("swap(fromToken, toToken, amount)"));
        assert!(prompt.contains("removeLiquidity(token0, token1, percent, amount0, amount1)"));
        assert!(prompt.contains(r#"{"error": "#));
    }
}
