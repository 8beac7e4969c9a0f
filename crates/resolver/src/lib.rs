//! Natural-language instruction resolution.
//!
//! An instruction plus a pool snapshot goes to a chat-completion backend; the
//! answer is reduced to a JSON object and validated into an [`Action`]
//! grounded in that pool. The model output is never trusted as-is.
//!
//! [`Action`]: nlswap_domain::Action

/// Completion backends and their configuration.
pub mod completion;
/// Resolution errors.
pub mod error;
/// Built-in instruction set.
pub mod eval;
/// JSON recovery from free-form answers.
pub mod extract;
/// System prompt construction.
pub mod prompt;
/// The resolver itself.
pub mod resolver;
/// Structured answer validation.
pub mod validate;

pub use completion::{
    CompletionClient, CompletionError, CompletionOverrides, CompletionRequest, CompletionResult,
    CompletionSettings, CustomEndpointClient, FallbackCompletion, OpenAiCompletionClient,
};
pub use error::ResolveError;
pub use eval::{BUILTIN_CASES, EvalCase, EvalOutcome, run_eval};
pub use resolver::ActionResolver;
