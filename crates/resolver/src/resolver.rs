use crate::completion::{CompletionClient, CompletionRequest, DEFAULT_TEMPERATURE};
use crate::error::ResolveError;
use crate::extract::extract_json_object;
use crate::prompt::build_system_prompt;
use crate::validate::validate_response;
use nlswap_domain::{Action, PoolSnapshot};
use std::sync::Arc;
use tracing::{info, warn};

/// Characters of a malformed answer kept for diagnosis.
const RAW_PREVIEW_CHARS: usize = 200;

/// Turns natural-language instructions into validated actions.
#[derive(Clone)]
pub struct ActionResolver {
    completion: Arc<dyn CompletionClient>,
}

impl ActionResolver {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Resolves `instruction` against `pool`.
    ///
    /// The pool is only read; the returned action refers to it by symbol.
    ///
    /// # Errors
    /// - [`ResolveError::MissingInput`] / [`ResolveError::MissingPoolContext`] for
    ///   empty arguments
    /// - [`ResolveError::CompletionUnavailable`] if no backend answered
    /// - [`ResolveError::MalformedModelResponse`] if no JSON object was found
    /// - any validation failure from the structured checks
    pub async fn resolve(
        &self,
        instruction: &str,
        pool: &PoolSnapshot,
    ) -> Result<Action, ResolveError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ResolveError::MissingInput);
        }
        if pool.token0_symbol.trim().is_empty() || pool.token1_symbol.trim().is_empty() {
            return Err(ResolveError::MissingPoolContext);
        }

        let request = CompletionRequest {
            system_prompt: build_system_prompt(pool),
            user_text: instruction.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        };
        let answer = self.completion.complete(&request).await?;

        let Some(object) = extract_json_object(&answer.content) else {
            let raw: String = answer.content.chars().take(RAW_PREVIEW_CHARS).collect();
            warn!(raw = %raw, "Model response is not JSON");
            return Err(ResolveError::MalformedModelResponse { raw });
        };

        let action = validate_response(&object, pool)?;
        info!(pool = %pool.address, action = %action, "Resolved instruction");
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionError, CompletionResult};
    use async_trait::async_trait;
    use nlswap_domain::{RemoveLiquidityParams, SwapParams};
    use primitive_types::U256;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Answers every request with the same text and records prompts.
    struct StubCompletion {
        answer: String,
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl StubCompletion {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for StubCompletion {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResult, CompletionError> {
            self.prompts.lock().unwrap().push(request.clone());
            Ok(CompletionResult {
                content: self.answer.clone(),
            })
        }
    }

    struct Unreachable;

    #[async_trait]
    impl CompletionClient for Unreachable {
        async fn complete(
            &self,
            _: &CompletionRequest,
        ) -> Result<CompletionResult, CompletionError> {
            Err(CompletionError::Network("connection refused".into()))
        }
    }

    fn eth_usdc() -> PoolSnapshot {
        PoolSnapshot::from_symbols(
            "0x1234567890123456789012345678901234567890",
            ("0x0000000000000000000000000000000000000001", "ETH"),
            ("0x0000000000000000000000000000000000000002", "USDC"),
            U256::from(10u64) * U256::exp10(18),
            U256::from(20_000u64) * U256::exp10(6),
        )
    }

    const SWAP_JSON: &str = r#"{"function":"swap","parameters":{"fromToken":"ETH","toToken":"USDC","amount":"0.1"}}"#;

    #[tokio::test]
    async fn test_resolves_swap() {
        let stub = StubCompletion::new(SWAP_JSON);
        let resolver = ActionResolver::new(stub.clone());

        let action = resolver
            .resolve("Swap 0.1 ETH for USDC", &eth_usdc())
            .await
            .unwrap();
        assert_eq!(
            action,
            Action::Swap(SwapParams {
                from_symbol: "ETH".into(),
                to_symbol: "USDC".into(),
                amount: dec!(0.1),
            })
        );

        let prompts = stub.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].user_text, "Swap 0.1 ETH for USDC");
        assert!(prompts[0].system_prompt.contains("Token1: USDC"));
        assert!((prompts[0].temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_fenced_answer_matches_bare_answer() {
        let bare = ActionResolver::new(StubCompletion::new(SWAP_JSON));
        let fenced = ActionResolver::new(StubCompletion::new(&format!("```json\n{SWAP_JSON}\n```")));
        let pool = eth_usdc();

        assert_eq!(
            bare.resolve("Swap 0.1 ETH for USDC", &pool).await,
            fenced.resolve("Swap 0.1 ETH for USDC", &pool).await
        );
    }

    #[tokio::test]
    async fn test_resolution_is_repeatable() {
        let resolver = ActionResolver::new(StubCompletion::new(
            r#"{"function":"removeLiquidity","parameters":{"token0":"ETH","token1":"USDC","percent":"50"}}"#,
        ));
        let pool = eth_usdc();
        let first = resolver
            .resolve("Remove 50% of my liquidity from ETH/USDC pool", &pool)
            .await
            .unwrap();
        let second = resolver
            .resolve("Remove 50% of my liquidity from ETH/USDC pool", &pool)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            Action::RemoveLiquidity(RemoveLiquidityParams {
                symbol0: "ETH".into(),
                symbol1: "USDC".into(),
                percent: Some(dec!(50)),
                amount0: None,
                amount1: None,
            })
        );
    }

    #[tokio::test]
    async fn test_preconditions() {
        let stub = StubCompletion::new(SWAP_JSON);
        let resolver = ActionResolver::new(stub.clone());
        assert_eq!(
            resolver.resolve("   ", &eth_usdc()).await,
            Err(ResolveError::MissingInput)
        );

        let mut pool = eth_usdc();
        pool.token1_symbol.clear();
        assert_eq!(
            resolver.resolve("Swap 0.1 ETH for USDC", &pool).await,
            Err(ResolveError::MissingPoolContext)
        );
        assert!(stub.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_answer_keeps_preview() {
        let long = "x".repeat(500);
        let resolver = ActionResolver::new(StubCompletion::new(&long));
        match resolver.resolve("Swap 0.1 ETH for USDC", &eth_usdc()).await {
            Err(ResolveError::MalformedModelResponse { raw }) => assert_eq!(raw.len(), 200),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let resolver = ActionResolver::new(Arc::new(Unreachable));
        assert!(matches!(
            resolver.resolve("Swap 0.1 ETH for USDC", &eth_usdc()).await,
            Err(ResolveError::CompletionUnavailable(CompletionError::Network(_)))
        ));
    }

    #[tokio::test]
    async fn test_wbtc_is_unknown_in_eth_usdc_pool() {
        let resolver = ActionResolver::new(StubCompletion::new(
            r#"{"function":"swap","parameters":{"fromToken":"ETH","toToken":"WBTC","amount":"1.5"}}"#,
        ));
        assert!(matches!(
            resolver.resolve("I want to trade 1.5 ETH for WBTC", &eth_usdc()).await,
            Err(ResolveError::UnknownToken { .. })
        ));
    }
}
