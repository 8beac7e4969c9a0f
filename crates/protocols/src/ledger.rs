//! Ledger-client seam.
//!
//! Everything that touches the chain goes through [`ContractReader`] and
//! [`ContractWriter`]. Values crossing this boundary are base-unit integers,
//! never floats.

use crate::uniswap_v2::abi::{self, AbiError};
use alloy::primitives::hex;
use async_trait::async_trait;
use nlswap_domain::serde_u256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transaction hash returned by a write, `0x`-prefixed hex.
pub type TxHash = String;

/// Errors reported by a ledger client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The wallet or signer declined the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    /// The transaction or call reverted on chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    /// The node could not be reached or returned a transport error.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    /// The node answered with something that is not a valid response.
    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
    /// Calldata could not be encoded or return data decoded.
    #[error(transparent)]
    Abi(#[from] AbiError),
}

/// A single ABI value, as passed to or returned from a contract function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum AbiValue {
    Address(String),
    Uint(#[serde(with = "serde_u256")] U256),
    Bool(bool),
    String(String),
    AddressArray(Vec<String>),
}

impl AbiValue {
    pub fn uint(value: impl Into<U256>) -> Self {
        Self::Uint(value.into())
    }

    pub fn address(value: impl Into<String>) -> Self {
        Self::Address(value.into())
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A call against a known contract function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCall {
    /// Target contract.
    pub address: String,
    /// Function name, resolved against the Uniswap V2 / ERC-20 interfaces.
    pub function: String,
    pub args: Vec<AbiValue>,
    /// Native value sent with the call, in wei.
    #[serde(default, with = "serde_u256::option", skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

impl ContractCall {
    pub fn new(
        address: impl Into<String>,
        function: impl Into<String>,
        args: Vec<AbiValue>,
    ) -> Self {
        Self {
            address: address.into(),
            function: function.into(),
            args,
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// ABI-encoded calldata: selector followed by the encoded arguments.
    ///
    /// # Errors
    /// Returns an error if the function is unknown or the arguments do not match
    /// its inputs.
    pub fn calldata(&self) -> Result<Vec<u8>, AbiError> {
        abi::encode_call(&self.function, &self.args)
    }

    /// Calldata as a `0x`-prefixed hex string.
    ///
    /// # Errors
    /// See [`ContractCall::calldata`].
    pub fn calldata_hex(&self) -> Result<String, AbiError> {
        self.calldata().map(hex::encode_prefixed)
    }

    /// Decodes raw return data of this call.
    ///
    /// # Errors
    /// Returns an error if the function is unknown or the data is malformed.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        abi::decode_output(&self.function, data)
    }
}

/// Read-only access to contract state.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Executes a view call and returns its decoded outputs.
    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, LedgerError>;
}

/// Submits state-changing calls.
///
/// Implementations must not retry on their own: a resubmitted approve or swap
/// can spend twice.
#[async_trait]
pub trait ContractWriter: Send + Sync {
    /// Signs and broadcasts a call.
    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash, LedgerError>;

    /// Waits until the transaction is mined. A reverted receipt is an error.
    async fn wait_for_confirmation(&self, tx: &TxHash) -> Result<(), LedgerError>;
}

/// Reads a single output and fails if it is absent.
pub(crate) fn first_output(
    mut outputs: Vec<AbiValue>,
    function: &str,
) -> Result<AbiValue, LedgerError> {
    if outputs.is_empty() {
        return Err(LedgerError::InvalidResponse(format!(
            "{function} returned no values"
        )));
    }
    Ok(outputs.swap_remove(0))
}
