//! Chain access for Uniswap V2 style deployments.
//!
//! The engine never talks to a node directly; it goes through the
//! [`ledger::ContractReader`] / [`ledger::ContractWriter`] seam. This crate
//! provides that seam, the Uniswap V2 interfaces, an alloy-backed RPC
//! implementation and an in-memory implementation for tests and demos.

/// Ledger-client traits and call types.
pub mod ledger;
/// In-memory ledger.
pub mod memory;
/// RPC ledger client.
pub mod rpc;
/// Uniswap V2 adapter.
pub mod uniswap_v2;

pub use ledger::{AbiValue, ContractCall, ContractReader, ContractWriter, LedgerError, TxHash};
pub use uniswap_v2::events::{SwapEvent, SwapLogSource};
pub use uniswap_v2::pair_reader::{PairData, PairReader};
