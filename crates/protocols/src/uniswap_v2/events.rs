//! Pair `Swap` event decoding.

use crate::ledger::LedgerError;
use crate::uniswap_v2::abi::{AbiError, IUniswapV2Pair::Swap, format_address, from_abi_u256};
use alloy::primitives::{B256, LogData};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use nlswap_domain::serde_u256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Topic0 of `Swap(address,uint256,uint256,uint256,uint256,address)`.
pub const SWAP_TOPIC: B256 = Swap::SIGNATURE_HASH;

/// One decoded `Swap` log with the timestamp of its block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEvent {
    pub block_number: u64,
    /// Unix seconds of the containing block.
    pub timestamp: u64,
    pub sender: String,
    pub to: String,
    #[serde(with = "serde_u256")]
    pub amount0_in: U256,
    #[serde(with = "serde_u256")]
    pub amount1_in: U256,
    #[serde(with = "serde_u256")]
    pub amount0_out: U256,
    #[serde(with = "serde_u256")]
    pub amount1_out: U256,
}

impl SwapEvent {
    /// Decodes a raw log.
    ///
    /// # Errors
    /// Returns an error if the log is not a `Swap` or its data is malformed.
    pub fn from_log(log: &LogData, block_number: u64, timestamp: u64) -> Result<Self, AbiError> {
        if log.topics().first() != Some(&SWAP_TOPIC) {
            return Err(AbiError::Decode("not a Swap event".to_string()));
        }
        let swap = Swap::decode_log_data(log)?;
        Ok(Self {
            block_number,
            timestamp,
            sender: format_address(swap.sender),
            to: format_address(swap.to),
            amount0_in: from_abi_u256(swap.amount0In),
            amount1_in: from_abi_u256(swap.amount1In),
            amount0_out: from_abi_u256(swap.amount0Out),
            amount1_out: from_abi_u256(swap.amount1Out),
        })
    }

    /// Token0 moved through the pair in either direction.
    pub fn volume0(&self) -> U256 {
        self.amount0_in.saturating_add(self.amount0_out)
    }

    /// Token1 moved through the pair in either direction.
    pub fn volume1(&self) -> U256 {
        self.amount1_in.saturating_add(self.amount1_out)
    }
}

/// Source of historical swaps for a pair.
#[async_trait]
pub trait SwapLogSource: Send + Sync {
    /// All swaps of `pair` in blocks at or after `since_timestamp`, oldest first.
    async fn swap_events(
        &self,
        pair: &str,
        since_timestamp: u64,
    ) -> Result<Vec<SwapEvent>, LedgerError>;
}
