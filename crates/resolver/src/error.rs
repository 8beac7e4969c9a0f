use crate::completion::CompletionError;
use thiserror::Error;

/// Why an instruction could not be turned into an action.
///
/// None of these are retried: the user has to rephrase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Missing input")]
    MissingInput,

    #[error("Missing pool information")]
    MissingPoolContext,

    #[error(transparent)]
    CompletionUnavailable(#[from] CompletionError),

    /// The model answered but no JSON object could be recovered. `raw` holds the
    /// start of the answer for diagnosis.
    #[error("Failed to parse LLM response")]
    MalformedModelResponse { raw: String },

    /// The model reported that the instruction does not map to an action.
    #[error("{0}")]
    UserInstructionUnclear(String),

    #[error("{}", invalid_function_message(.0))]
    InvalidFunction(Option<String>),

    #[error("Missing parameters in response: {0}")]
    MissingParameters(String),

    #[error("Unknown token {symbol}: the {pair} pool only trades its own tokens")]
    UnknownToken { symbol: String, pair: String },

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

fn invalid_function_message(function: &Option<String>) -> String {
    match function {
        Some(name) => format!("Invalid function: {name}"),
        None => "Missing function in response".to_string(),
    }
}

impl ResolveError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
