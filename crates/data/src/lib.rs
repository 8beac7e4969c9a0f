//! Pool data access.
//!
//! This crate keeps the set of known pools fresh and derives chart data from
//! on-chain swap history:
//! - A catalog of pool snapshots with background refresh and factory discovery
//! - Demonstration pools for running without a node
//! - Daily volume and price aggregation of `Swap` events

/// Pool catalog.
pub mod catalog;
/// Demonstration pools.
pub mod demo;
/// Swap history aggregation.
pub mod swap_history;

pub use catalog::{CatalogConfig, PoolCatalog};
pub use demo::demo_pools;
pub use swap_history::{
    DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS, SwapHistory, aggregate_swaps, load_swap_history,
};
