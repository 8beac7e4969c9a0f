use crate::runner::StepReceipt;
use nlswap_domain::MathError;
use nlswap_protocols::LedgerError;
use thiserror::Error;

/// Why an action could not be turned into ledger calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Unknown token {symbol}: not part of the {pair} pool")]
    UnknownToken { symbol: String, pair: String },

    /// The action is well-formed but cannot be executed as stated.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("No liquidity position in the {0} pool")]
    MissingLpPosition(String),
}

/// A plan step failed; earlier steps stay applied.
#[derive(Debug, Clone, Error)]
#[error("Step {step} ({function}) failed: {source}")]
pub struct RunError {
    /// Zero-based index of the failing call.
    pub step: usize,
    pub function: String,
    /// Calls confirmed before the failure.
    pub completed: Vec<StepReceipt>,
    #[source]
    pub source: LedgerError,
}
