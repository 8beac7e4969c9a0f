//! HTTP surface.
//!
//! This crate exposes the resolver, planner and pool data to the browser UI:
//! - Instruction resolution and action planning
//! - Pair lookup, pair data and swap history
//! - Swap quotes and the pool listing

/// Error types.
pub mod error;
/// Request extractors.
pub mod extract;
/// Request handlers.
pub mod handlers;
/// API request/response models.
pub mod models;
/// Route definitions.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
