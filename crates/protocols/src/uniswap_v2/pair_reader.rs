//! Reads factory and pair state through a [`ContractReader`].

use crate::ledger::{AbiValue, ContractCall, ContractReader, LedgerError, first_output};
use crate::uniswap_v2::abi::is_zero_address;
use nlswap_domain::PoolSnapshot;
use nlswap_domain::serde_u256;
use nlswap_domain::token::default_decimals;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Symbol reported when a token's `symbol()` cannot be read.
pub const UNKNOWN_SYMBOL: &str = "Unknown";

/// On-chain state of a pair together with its tokens' metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairData {
    pub pair: String,
    pub token0: String,
    pub token1: String,
    pub token0_symbol: String,
    pub token1_symbol: String,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
    #[serde(with = "serde_u256")]
    pub reserve0: U256,
    #[serde(with = "serde_u256")]
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

impl PairData {
    /// Converts into an immutable pool snapshot.
    pub fn into_snapshot(self) -> PoolSnapshot {
        PoolSnapshot {
            address: self.pair,
            token0: self.token0,
            token1: self.token1,
            token0_symbol: self.token0_symbol,
            token1_symbol: self.token1_symbol,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            fee_rate_bps: nlswap_domain::pool::DEFAULT_FEE_BPS,
            decimals0: self.token0_decimals,
            decimals1: self.token1_decimals,
            block_timestamp_last: Some(self.block_timestamp_last),
        }
    }
}

/// Factory and pair queries.
#[derive(Clone)]
pub struct PairReader {
    reader: Arc<dyn ContractReader>,
}

impl PairReader {
    pub fn new(reader: Arc<dyn ContractReader>) -> Self {
        Self { reader }
    }

    /// Resolves the pair of two tokens through the factory.
    ///
    /// The factory is asked with the tokens in the given order first and, if it
    /// answers with the zero address, once more in reverse order. Returns `None`
    /// when neither order has a pair.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the factory cannot be queried.
    pub async fn find_pair(
        &self,
        factory: &str,
        token_a: &str,
        token_b: &str,
    ) -> Result<Option<String>, LedgerError> {
        for (first, second) in [(token_a, token_b), (token_b, token_a)] {
            let call = ContractCall::new(
                factory,
                "getPair",
                vec![AbiValue::address(first), AbiValue::address(second)],
            );
            let pair = self.read_address(&call).await?;
            if !is_zero_address(&pair) {
                info!(factory, pair = %pair, "Resolved pair address");
                return Ok(Some(pair));
            }
            debug!(factory, token_a = first, token_b = second, "No pair for token order");
        }
        Ok(None)
    }

    /// Number of pairs created by the factory.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the factory cannot be queried.
    pub async fn all_pairs_length(&self, factory: &str) -> Result<u64, LedgerError> {
        let call = ContractCall::new(factory, "allPairsLength", vec![]);
        let len = self.read_uint(&call).await?;
        Ok(if len > U256::from(u64::MAX) {
            u64::MAX
        } else {
            len.as_u64()
        })
    }

    /// The `index`-th pair created by the factory, or `None` past the end.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the factory cannot be queried.
    pub async fn pair_at(&self, factory: &str, index: u64) -> Result<Option<String>, LedgerError> {
        if index >= self.all_pairs_length(factory).await? {
            return Ok(None);
        }
        let call = ContractCall::new(factory, "allPairs", vec![AbiValue::uint(index)]);
        self.read_address(&call).await.map(Some)
    }

    /// Reads tokens, reserves and token metadata of a pair.
    ///
    /// Token symbol and decimals are best effort: a token that does not answer
    /// `symbol()` is reported as `"Unknown"`, and one that does not answer
    /// `decimals()` falls back to the symbol registry (18 for unknown symbols).
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if `token0`, `token1` or `getReserves` fail.
    pub async fn pair_data(&self, pair: &str) -> Result<PairData, LedgerError> {
        let token0_call = ContractCall::new(pair, "token0", vec![]);
        let token1_call = ContractCall::new(pair, "token1", vec![]);
        let reserves_call = ContractCall::new(pair, "getReserves", vec![]);

        let (token0, token1, reserves) = tokio::try_join!(
            self.read_address(&token0_call),
            self.read_address(&token1_call),
            self.reader.read_contract(&reserves_call),
        )?;

        let reserve = |i: usize| -> Result<U256, LedgerError> {
            reserves.get(i).and_then(AbiValue::as_u256).ok_or_else(|| {
                LedgerError::InvalidResponse(format!("getReserves is missing value {i}"))
            })
        };
        let reserve0 = reserve(0)?;
        let reserve1 = reserve(1)?;
        let block_timestamp_last = reserve(2)?.low_u32();

        let ((token0_symbol, token0_decimals), (token1_symbol, token1_decimals)) =
            tokio::join!(self.token_metadata(&token0), self.token_metadata(&token1));

        info!(
            pair,
            token0 = %token0_symbol,
            token1 = %token1_symbol,
            reserve0 = %reserve0,
            reserve1 = %reserve1,
            "Read pair data"
        );

        Ok(PairData {
            pair: pair.to_string(),
            token0,
            token1,
            token0_symbol,
            token1_symbol,
            token0_decimals,
            token1_decimals,
            reserve0,
            reserve1,
            block_timestamp_last,
        })
    }

    /// Reads a pair and returns it as a snapshot.
    ///
    /// # Errors
    /// See [`PairReader::pair_data`].
    pub async fn snapshot(&self, pair: &str) -> Result<PoolSnapshot, LedgerError> {
        self.pair_data(pair).await.map(PairData::into_snapshot)
    }

    /// `(symbol, decimals)` of a token, with fallbacks instead of errors.
    pub async fn token_metadata(&self, token: &str) -> (String, u8) {
        let symbol_call = ContractCall::new(token, "symbol", vec![]);
        let decimals_call = ContractCall::new(token, "decimals", vec![]);
        let (symbol, decimals) = tokio::join!(
            self.reader.read_contract(&symbol_call),
            self.read_uint(&decimals_call),
        );

        let symbol = match symbol {
            Ok(values) => match values.first().and_then(AbiValue::as_str) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => UNKNOWN_SYMBOL.to_string(),
            },
            Err(e) => {
                warn!(token, error = %e, "Failed to read token symbol");
                UNKNOWN_SYMBOL.to_string()
            }
        };

        let decimals = match decimals {
            Ok(d) if d <= U256::from(77u8) => d.low_u32() as u8,
            Ok(d) => {
                warn!(token, decimals = %d, "Token reports out of range decimals");
                default_decimals(&symbol)
            }
            Err(e) => {
                warn!(token, error = %e, "Failed to read token decimals");
                default_decimals(&symbol)
            }
        };

        (symbol, decimals)
    }

    async fn read_address(&self, call: &ContractCall) -> Result<String, LedgerError> {
        let value = first_output(self.reader.read_contract(call).await?, &call.function)?;
        value.as_address().map(str::to_string).ok_or_else(|| {
            LedgerError::InvalidResponse(format!("{} did not return an address", call.function))
        })
    }

    async fn read_uint(&self, call: &ContractCall) -> Result<U256, LedgerError> {
        let value = first_output(self.reader.read_contract(call).await?, &call.function)?;
        value.as_u256().ok_or_else(|| {
            LedgerError::InvalidResponse(format!("{} did not return an integer", call.function))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;

    const FACTORY: &str = "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f";
    const PAIR: &str = "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const ZERO: &str = "0x0000000000000000000000000000000000000000";

    fn eth_usdc() -> PoolSnapshot {
        PoolSnapshot::from_symbols(
            PAIR,
            (WETH, "WETH"),
            (USDC, "USDC"),
            U256::from(10u64) * U256::exp10(18),
            U256::from(20_000u64) * U256::exp10(6),
        )
    }

    #[tokio::test]
    async fn test_find_pair_retries_reverse_order() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_read(
            ContractCall::new(
                FACTORY,
                "getPair",
                vec![AbiValue::address(USDC), AbiValue::address(WETH)],
            ),
            vec![AbiValue::address(ZERO)],
        );
        ledger.set_read(
            ContractCall::new(
                FACTORY,
                "getPair",
                vec![AbiValue::address(WETH), AbiValue::address(USDC)],
            ),
            vec![AbiValue::address(PAIR)],
        );

        let reader = PairReader::new(ledger);
        let pair = reader.find_pair(FACTORY, USDC, WETH).await.unwrap();
        assert_eq!(pair.as_deref(), Some(PAIR));
    }

    #[tokio::test]
    async fn test_find_pair_returns_none_when_missing() {
        let ledger = Arc::new(InMemoryLedger::new());
        for (a, b) in [(USDC, WETH), (WETH, USDC)] {
            ledger.set_read(
                ContractCall::new(FACTORY, "getPair", vec![AbiValue::address(a), AbiValue::address(b)]),
                vec![AbiValue::address(ZERO)],
            );
        }
        let reader = PairReader::new(ledger);
        assert_eq!(reader.find_pair(FACTORY, USDC, WETH).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pair_data_reads_metadata() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed_pool(&eth_usdc(), U256::exp10(18));

        let data = PairReader::new(ledger).pair_data(PAIR).await.unwrap();
        assert_eq!(data.token0_symbol, "WETH");
        assert_eq!(data.token1_decimals, 6);
        assert_eq!(data.reserve1, U256::from(20_000_000_000u64));
    }

    #[tokio::test]
    async fn test_pair_data_falls_back_for_unreadable_token() {
        let ledger = Arc::new(InMemoryLedger::new());
        let pool = eth_usdc();
        ledger.seed_pool(&pool, U256::exp10(18));
        ledger.remove_read(&ContractCall::new(USDC, "symbol", vec![]));
        ledger.remove_read(&ContractCall::new(USDC, "decimals", vec![]));

        let data = PairReader::new(ledger).pair_data(PAIR).await.unwrap();
        assert_eq!(data.token1_symbol, UNKNOWN_SYMBOL);
        assert_eq!(data.token1_decimals, 18);
        assert_eq!(data.token0_symbol, "WETH");
    }

    #[tokio::test]
    async fn test_pair_at_past_end() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_read(
            ContractCall::new(FACTORY, "allPairsLength", vec![]),
            vec![AbiValue::uint(1u64)],
        );
        ledger.set_read(
            ContractCall::new(FACTORY, "allPairs", vec![AbiValue::uint(0u64)]),
            vec![AbiValue::address(PAIR)],
        );
        let reader = PairReader::new(ledger);
        assert_eq!(reader.pair_at(FACTORY, 0).await.unwrap().as_deref(), Some(PAIR));
        assert_eq!(reader.pair_at(FACTORY, 1).await.unwrap(), None);
    }
}
