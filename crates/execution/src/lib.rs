//! Execution planning and submission.
//!
//! This crate turns validated actions into ledger calls:
//! - Account state gathering (allowances, LP position)
//! - Planning approvals and the router call with slippage-bounded minimums
//! - Sequential submission that waits for each confirmation and never retries

/// Executor configuration.
pub mod config;
/// Per-user account state.
pub mod context;
/// Planning and run errors.
pub mod error;
/// Action planning.
pub mod executor;
/// Execution plans.
pub mod plan;
/// Plan submission.
pub mod runner;

pub use config::ExecutorConfig;
pub use context::{AccountContext, gather_account_context};
pub use error::{PlanError, RunError};
pub use executor::{ActionExecutor, SwapQuote};
pub use plan::{ExecutionPlan, PlanSummary};
pub use runner::{PlanRunner, RunReport, StepReceipt};
