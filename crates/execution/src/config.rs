//! Executor configuration.

/// Uniswap V2 router on Ethereum mainnet.
pub const DEFAULT_ROUTER_ADDRESS: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";

/// Configuration for planning actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Slippage tolerance applied to every minimum, in basis points.
    pub slippage_bps: u32,
    /// Seconds added to the current time for the router deadline.
    pub deadline_secs: u64,
    /// Router that receives swaps and liquidity changes.
    pub router_address: String,
    /// Wrapped ether; when set, `ETH` sides use the native router variants.
    pub weth_address: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 500, // 5%
            deadline_secs: 20 * 60,
            router_address: DEFAULT_ROUTER_ADDRESS.to_string(),
            weth_address: None,
        }
    }
}

impl ExecutorConfig {
    /// Reads `ROUTER_ADDRESS`, `WETH_ADDRESS` and `SLIPPAGE_BPS`.
    ///
    /// Unset, empty or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            slippage_bps: var("SLIPPAGE_BPS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.slippage_bps),
            deadline_secs: defaults.deadline_secs,
            router_address: var("ROUTER_ADDRESS").unwrap_or(defaults.router_address),
            weth_address: var("WETH_ADDRESS"),
        }
    }

    /// Returns a copy with a different slippage tolerance.
    #[must_use]
    pub fn with_slippage_bps(&self, slippage_bps: u32) -> Self {
        Self {
            slippage_bps,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.slippage_bps, 500);
        assert_eq!(config.deadline_secs, 1200);
        assert!(config.weth_address.is_none());
        assert_eq!(config.with_slippage_bps(50).slippage_bps, 50);
    }
}
