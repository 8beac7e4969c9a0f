//! Ledger client over an Ethereum JSON-RPC node.
//!
//! [`RpcLedger`] wraps an alloy provider and implements [`ContractReader`] with
//! `eth_call`, [`SwapLogSource`] with `eth_getLogs`, and [`ContractWriter`]
//! either through a local private key or through an account the node itself
//! unlocks (e.g. a dev node).

use crate::ledger::{AbiValue, ContractCall, ContractReader, ContractWriter, LedgerError, TxHash};
use crate::uniswap_v2::abi::{format_address, parse_address, to_abi_u256};
use crate::uniswap_v2::events::{SWAP_TOPIC, SwapEvent, SwapLogSource};
use alloy::eips::BlockNumberOrTag;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// EIP-1193 code for a request the user declined.
const USER_REJECTED: i64 = 4001;
/// Geth / Anvil code for an execution revert.
const EXECUTION_REVERTED: i64 = 3;

/// Configuration for [`RpcLedger`].
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    /// Upper bound for a single node request.
    pub request_timeout: Duration,
    /// Interval between receipt polls while waiting for confirmation.
    pub receipt_poll_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            request_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Maps a node error code and message onto the ledger error taxonomy.
fn classify(code: i64, message: &str) -> LedgerError {
    if code == USER_REJECTED {
        LedgerError::Rejected(message.to_string())
    } else if code == EXECUTION_REVERTED || message.to_ascii_lowercase().contains("revert") {
        LedgerError::Reverted(message.to_string())
    } else {
        LedgerError::Unavailable(format!("{message} (code: {code})"))
    }
}

fn ledger_error(e: TransportError) -> LedgerError {
    match e {
        RpcError::ErrorResp(payload) => {
            error!(code = payload.code, message = %payload.message, "JSON-RPC error");
            classify(payload.code, &payload.message)
        }
        e @ (RpcError::DeserError { .. } | RpcError::NullResp) => {
            LedgerError::InvalidResponse(e.to_string())
        }
        other => LedgerError::Unavailable(other.to_string()),
    }
}

/// Chain access through an alloy [`DynProvider`].
#[derive(Clone)]
pub struct RpcLedger {
    provider: DynProvider,
    config: RpcConfig,
    /// Account writes are sent from; `None` for a read-only ledger.
    sender: Option<Address>,
    block_timestamps: Arc<RwLock<HashMap<u64, u64>>>,
}

impl RpcLedger {
    /// Read-only ledger for `config.url`.
    ///
    /// # Errors
    /// Returns [`LedgerError::Unavailable`] if the URL is invalid.
    pub fn connect(config: RpcConfig) -> Result<Self, LedgerError> {
        let url = parse_url(&config.url)?;
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));
        info!(url = %config.url, "Connected RPC ledger");
        Ok(Self::from_provider(provider, config, None))
    }

    /// Ledger that signs writes locally with `private_key`.
    ///
    /// # Errors
    /// Returns [`LedgerError::Unavailable`] if the URL or the key is invalid.
    pub fn with_private_key(config: RpcConfig, private_key: &str) -> Result<Self, LedgerError> {
        let url = parse_url(&config.url)?;
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|_| LedgerError::Unavailable("invalid private key".to_string()))?;
        let sender = signer.address();
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url),
        );
        info!(url = %config.url, sender = %format_address(sender), "Connected signing RPC ledger");
        Ok(Self::from_provider(provider, config, Some(sender)))
    }

    /// Sends writes from `from`, an account the node signs for.
    ///
    /// # Errors
    /// Returns an error if `from` is not an address.
    pub fn with_node_account(mut self, from: &str) -> Result<Self, LedgerError> {
        self.sender = Some(parse_address(from)?);
        Ok(self)
    }

    fn from_provider(provider: DynProvider, config: RpcConfig, sender: Option<Address>) -> Self {
        Self {
            provider,
            config,
            sender,
            block_timestamps: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Account writes are sent from, lower-case hex.
    pub fn sender(&self) -> Option<String> {
        self.sender.map(format_address)
    }

    async fn timed<T>(
        &self,
        what: &str,
        request: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, LedgerError> {
        debug!(request = what, "RPC request");
        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result.map_err(ledger_error),
            Err(_) => Err(LedgerError::Unavailable(format!("{what} timed out"))),
        }
    }

    /// Timestamp of a block, cached per block number.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the block cannot be fetched.
    pub async fn block_timestamp(&self, number: u64) -> Result<u64, LedgerError> {
        if let Some(ts) = self.block_timestamps.read().await.get(&number) {
            return Ok(*ts);
        }
        let block = self
            .timed("eth_getBlockByNumber", async {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .await
            })
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse(format!("block {number} not found")))?;
        let ts = block.header.timestamp;
        self.block_timestamps.write().await.insert(number, ts);
        Ok(ts)
    }
}

fn parse_url(raw: &str) -> Result<Url, LedgerError> {
    raw.parse()
        .map_err(|e| LedgerError::Unavailable(format!("invalid RPC URL {raw}: {e}")))
}

fn parse_tx_hash(tx: &str) -> Result<B256, LedgerError> {
    tx.parse()
        .map_err(|_| LedgerError::InvalidResponse(format!("invalid transaction hash {tx}")))
}

#[async_trait]
impl ContractReader for RpcLedger {
    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, LedgerError> {
        let request = TransactionRequest::default()
            .with_to(parse_address(&call.address)?)
            .with_input(call.calldata()?);
        let raw = self
            .timed("eth_call", async { self.provider.call(request).await })
            .await?;
        call.decode_output(&raw).map_err(|e| {
            if raw.is_empty() {
                LedgerError::Reverted(format!(
                    "{} on {} returned no data",
                    call.function, call.address
                ))
            } else {
                e.into()
            }
        })
    }
}

#[async_trait]
impl SwapLogSource for RpcLedger {
    async fn swap_events(
        &self,
        pair: &str,
        since_timestamp: u64,
    ) -> Result<Vec<SwapEvent>, LedgerError> {
        let filter = Filter::new()
            .address(parse_address(pair)?)
            .event_signature(SWAP_TOPIC)
            .from_block(0u64);
        let logs = self
            .timed("eth_getLogs", async { self.provider.get_logs(&filter).await })
            .await?;
        info!(pair, count = logs.len(), "Fetched swap logs");

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            let Some(block_number) = log.block_number else {
                continue;
            };
            let timestamp = match log.block_timestamp {
                Some(ts) => ts,
                None => self.block_timestamp(block_number).await?,
            };
            if timestamp < since_timestamp {
                continue;
            }
            match SwapEvent::from_log(log.data(), block_number, timestamp) {
                Ok(event) => events.push(event),
                Err(e) => warn!(pair, block_number, error = %e, "Skipping undecodable swap log"),
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl ContractWriter for RpcLedger {
    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, LedgerError> {
        let from = self
            .sender
            .ok_or_else(|| LedgerError::Unavailable("no sending account configured".into()))?;
        let mut request = TransactionRequest::default()
            .with_from(from)
            .with_to(parse_address(&call.address)?)
            .with_input(call.calldata()?);
        if let Some(value) = call.value {
            request = request.with_value(to_abi_u256(value));
        }

        info!(function = %call.function, to = %call.address, "Sending transaction");
        let pending = self
            .timed("eth_sendTransaction", async {
                self.provider.send_transaction(request).await
            })
            .await?;
        Ok(format!("{:#x}", pending.tx_hash()))
    }

    async fn wait_for_confirmation(&self, tx: &TxHash) -> Result<(), LedgerError> {
        let hash = parse_tx_hash(tx)?;
        loop {
            let receipt = self
                .timed("eth_getTransactionReceipt", async {
                    self.provider.get_transaction_receipt(hash).await
                })
                .await?;
            if let Some(receipt) = receipt {
                if receipt.status() {
                    info!(tx = %tx, block = ?receipt.block_number, "Transaction confirmed");
                    return Ok(());
                }
                error!(tx = %tx, "Transaction reverted");
                return Err(LedgerError::Reverted(format!("transaction {tx} reverted")));
            }
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_rpc_error_mapping() {
        assert!(matches!(
            classify(4001, "User denied transaction signature"),
            LedgerError::Rejected(_)
        ));
        assert!(matches!(
            classify(-32000, "execution reverted: UniswapV2Router: EXPIRED"),
            LedgerError::Reverted(_)
        ));
        assert!(matches!(classify(3, "execution reverted"), LedgerError::Reverted(_)));
        assert!(matches!(
            classify(-32005, "limit exceeded"),
            LedgerError::Unavailable(_)
        ));
    }

    #[test]
    fn test_default_config_points_at_local_node() {
        let config = RpcConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:8545");
        let ledger = RpcLedger::connect(config).unwrap();
        assert_eq!(ledger.sender(), None);
    }

    #[test]
    fn test_invalid_url_is_unavailable() {
        let config = RpcConfig {
            url: "not a url".into(),
            ..RpcConfig::default()
        };
        assert!(matches!(
            RpcLedger::connect(config),
            Err(LedgerError::Unavailable(_))
        ));
    }

    #[test]
    fn test_private_key_sets_sender() {
        let ledger = RpcLedger::with_private_key(RpcConfig::default(), ANVIL_KEY).unwrap();
        assert_eq!(
            ledger.sender().as_deref(),
            Some("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
        assert!(RpcLedger::with_private_key(RpcConfig::default(), "0x1234").is_err());
    }

    #[test]
    fn test_node_account_sets_sender() {
        let ledger = RpcLedger::connect(RpcConfig::default())
            .unwrap()
            .with_node_account("0x00000000000000000000000000000000000000AA")
            .unwrap();
        assert_eq!(
            ledger.sender().as_deref(),
            Some("0x00000000000000000000000000000000000000aa")
        );
    }

    #[test]
    fn test_parse_tx_hash() {
        assert!(parse_tx_hash(&format!("0x{:064x}", 1)).is_ok());
        assert!(matches!(
            parse_tx_hash("0x12"),
            Err(LedgerError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_write_without_sender_fails() {
        let ledger = RpcLedger::connect(RpcConfig::default()).unwrap();
        let call = ContractCall::new(
            "0x0000000000000000000000000000000000000001",
            "totalSupply",
            vec![],
        );
        assert!(matches!(
            ledger.write_contract(&call).await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
