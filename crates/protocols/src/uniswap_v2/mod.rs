//! Uniswap V2 protocol adapter.
//!
//! This module provides functionality to interact with Uniswap V2 deployments:
//! - Encode and decode factory, pair, router and ERC-20 calls
//! - Read pair state and token metadata
//! - Build router calls for swaps and liquidity changes
//! - Decode `Swap` events

/// Contract interfaces and call encoding.
pub mod abi;
/// Swap event decoding.
pub mod events;
/// Factory and pair reads.
pub mod pair_reader;
/// Router call builders.
pub mod router;
