//! Built-in instruction set for checking a resolver backend.

use crate::error::ResolveError;
use crate::resolver::ActionResolver;
use nlswap_domain::{Action, PoolSnapshot};
use tracing::info;

/// One instruction with the action it should resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalCase {
    pub input: &'static str,
    /// Pair label of the pool the instruction targets, e.g. `ETH/USDC`.
    pub pair: &'static str,
    /// Expected action as `{function, parameters}` JSON.
    pub expected: &'static str,
}

impl EvalCase {
    /// Parses [`EvalCase::expected`].
    ///
    /// # Errors
    /// Returns the JSON error if the expectation is malformed.
    pub fn expected_action(&self) -> Result<Action, serde_json::Error> {
        serde_json::from_str(self.expected)
    }
}

/// Swap, add and remove phrasings across the demonstration pools.
pub const BUILTIN_CASES: &[EvalCase] = &[
    EvalCase {
        input: "Swap 0.1 ETH for USDC",
        pair: "ETH/USDC",
        expected: r#"{"function":"swap","parameters":{"fromToken":"ETH","toToken":"USDC","amount":"0.1"}}"#,
    },
    EvalCase {
        input: "Exchange 100 USDC for ETH",
        pair: "ETH/USDC",
        expected: r#"{"function":"swap","parameters":{"fromToken":"USDC","toToken":"ETH","amount":"100"}}"#,
    },
    EvalCase {
        input: "Add liquidity with 0.5 ETH and 1000 USDC",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"0.5","amount1":"1000"}}"#,
    },
    EvalCase {
        input: "Add liquidity with 0.5 ETH to ETH/USDC pool",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"0.5"}}"#,
    },
    EvalCase {
        input: "Remove 50% of my liquidity from ETH/USDC pool",
        pair: "ETH/USDC",
        expected: r#"{"function":"removeLiquidity","parameters":{"token0":"ETH","token1":"USDC","percent":"50"}}"#,
    },
    EvalCase {
        input: "I want to trade 1.5 ETH for WBTC",
        pair: "WBTC/ETH",
        expected: r#"{"function":"swap","parameters":{"fromToken":"ETH","toToken":"WBTC","amount":"1.5"}}"#,
    },
    EvalCase {
        input: "Provide 2 ETH and 4000 USDC as liquidity",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"2","amount1":"4000"}}"#,
    },
    EvalCase {
        input: "Withdraw all my liquidity from ETH/USDC pool",
        pair: "ETH/USDC",
        expected: r#"{"function":"removeLiquidity","parameters":{"token0":"ETH","token1":"USDC","percent":"100"}}"#,
    },
    EvalCase {
        input: "Swap exactly 500 USDC for ETH",
        pair: "ETH/USDC",
        expected: r#"{"function":"swap","parameters":{"fromToken":"USDC","toToken":"ETH","amount":"500"}}"#,
    },
    EvalCase {
        input: "Convert 0.25 ETH to WBTC",
        pair: "WBTC/ETH",
        expected: r#"{"function":"swap","parameters":{"fromToken":"ETH","toToken":"WBTC","amount":"0.25"}}"#,
    },
    EvalCase {
        input: "Add liquidity: 0.75 ETH and 1500 USDC",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"0.75","amount1":"1500"}}"#,
    },
    EvalCase {
        input: "Remove 25% of my ETH/USDC liquidity",
        pair: "ETH/USDC",
        expected: r#"{"function":"removeLiquidity","parameters":{"token0":"ETH","token1":"USDC","percent":"25"}}"#,
    },
    EvalCase {
        input: "I'd like to provide liquidity with 3 ETH and 6000 USDC",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"3","amount1":"6000"}}"#,
    },
    EvalCase {
        input: "Exchange 1 WBTC for ETH",
        pair: "WBTC/ETH",
        expected: r#"{"function":"swap","parameters":{"fromToken":"WBTC","toToken":"ETH","amount":"1"}}"#,
    },
    EvalCase {
        input: "Withdraw 75% liquidity from WBTC/ETH pool",
        pair: "WBTC/ETH",
        expected: r#"{"function":"removeLiquidity","parameters":{"token0":"WBTC","token1":"ETH","percent":"75"}}"#,
    },
    EvalCase {
        input: "Add 0.3 ETH and 600 USDC as liquidity",
        pair: "ETH/USDC",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount0":"0.3","amount1":"600"}}"#,
    },
    EvalCase {
        input: "Provide 0.1 WBTC and 0.5 ETH as liquidity",
        pair: "WBTC/ETH",
        expected: r#"{"function":"addLiquidity","parameters":{"token0":"WBTC","token1":"ETH","amount0":"0.1","amount1":"0.5"}}"#,
    },
    EvalCase {
        input: "Remove liquidity worth 1000 USDC from the ETH/USDC pool",
        pair: "ETH/USDC",
        expected: r#"{"function":"removeLiquidity","parameters":{"token0":"ETH","token1":"USDC","amount1":"1000"}}"#,
    },
];

/// Result of running one case.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub case: EvalCase,
    /// `None` when no pool with the case's pair label was supplied.
    pub resolved: Option<Result<Action, ResolveError>>,
}

impl EvalOutcome {
    /// Whether the resolved action equals the expectation.
    pub fn passed(&self) -> bool {
        match (&self.resolved, self.case.expected_action()) {
            (Some(Ok(action)), Ok(expected)) => *action == expected,
            _ => false,
        }
    }
}

/// Runs `cases` sequentially, each against the pool whose label matches.
pub async fn run_eval(
    resolver: &ActionResolver,
    cases: &[EvalCase],
    pools: &[PoolSnapshot],
) -> Vec<EvalOutcome> {
    let mut outcomes = Vec::with_capacity(cases.len());
    for case in cases {
        let pool = pools
            .iter()
            .find(|p| p.pair_label().eq_ignore_ascii_case(case.pair));
        let resolved = match pool {
            Some(pool) => Some(resolver.resolve(case.input, pool).await),
            None => None,
        };
        outcomes.push(EvalOutcome {
            case: *case,
            resolved,
        });
    }

    let passed = outcomes.iter().filter(|o| o.passed()).count();
    info!(passed, total = outcomes.len(), "Evaluation finished");
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionClient, CompletionError, CompletionRequest, CompletionResult};
    use async_trait::async_trait;
    use primitive_types::U256;
    use std::sync::Arc;

    /// Answers with the expected JSON of whichever case matches the user text.
    struct Oracle;

    #[async_trait]
    impl CompletionClient for Oracle {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResult, CompletionError> {
            BUILTIN_CASES
                .iter()
                .find(|c| c.input == request.user_text)
                .map(|c| CompletionResult {
                    content: c.expected.to_string(),
                })
                .ok_or(CompletionError::Empty)
        }
    }

    fn pools() -> Vec<PoolSnapshot> {
        vec![
            PoolSnapshot::from_symbols(
                "0x0000000000000000000000000000000000000a01",
                ("0x0000000000000000000000000000000000000001", "ETH"),
                ("0x0000000000000000000000000000000000000002", "USDC"),
                U256::from(10u64) * U256::exp10(18),
                U256::from(20_000u64) * U256::exp10(6),
            ),
            PoolSnapshot::from_symbols(
                "0x0000000000000000000000000000000000000a02",
                ("0x0000000000000000000000000000000000000003", "WBTC"),
                ("0x0000000000000000000000000000000000000001", "ETH"),
                U256::from(2u64) * U256::exp10(8),
                U256::from(60u64) * U256::exp10(18),
            ),
        ]
    }

    #[test]
    fn test_expectations_parse() {
        for case in BUILTIN_CASES {
            let action = case.expected_action().unwrap();
            for symbol in action.symbols() {
                assert!(case.pair.contains(symbol), "{} uses {symbol}", case.input);
            }
        }
    }

    #[tokio::test]
    async fn test_oracle_passes_every_case() {
        let resolver = ActionResolver::new(Arc::new(Oracle));
        let outcomes = run_eval(&resolver, BUILTIN_CASES, &pools()).await;
        assert_eq!(outcomes.len(), BUILTIN_CASES.len());
        for outcome in &outcomes {
            assert!(outcome.passed(), "{}: {:?}", outcome.case.input, outcome.resolved);
        }
    }

    #[tokio::test]
    async fn test_missing_pool_is_skipped() {
        let resolver = ActionResolver::new(Arc::new(Oracle));
        let outcomes = run_eval(&resolver, &BUILTIN_CASES[..1], &[]).await;
        assert!(outcomes[0].resolved.is_none());
        assert!(!outcomes[0].passed());
    }
}
