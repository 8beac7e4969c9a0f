//! API error type and its HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nlswap_execution::PlanError;
use nlswap_protocols::LedgerError;
use nlswap_protocols::uniswap_v2::abi::AbiError;
use nlswap_resolver::{CompletionError, ResolveError};
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by the HTTP handlers.
///
/// Every variant renders as `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request parameters.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A ledger read failed while serving the request.
    #[error("{message}: {source}")]
    Ledger {
        message: &'static str,
        #[source]
        source: LedgerError,
    },

    #[error("Failed to encode calldata: {0}")]
    Encoding(#[from] AbiError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Wraps a ledger failure with a message describing what was being fetched.
    pub fn ledger(message: &'static str) -> impl FnOnce(LedgerError) -> Self {
        move |source| Self::Ledger { message, source }
    }

    /// Status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Resolve(e) => resolve_status(e),
            Self::Plan(_) => StatusCode::BAD_REQUEST,
            Self::Ledger { .. } | Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn resolve_status(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::CompletionUnavailable(CompletionError::Unauthorized) => {
            StatusCode::UNAUTHORIZED
        }
        ResolveError::CompletionUnavailable(CompletionError::RateLimited) => {
            StatusCode::TOO_MANY_REQUESTS
        }
        ResolveError::CompletionUnavailable(_) | ResolveError::MalformedModelResponse { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ResolveError::MissingInput
        | ResolveError::MissingPoolContext
        | ResolveError::UserInstructionUnclear(_)
        | ResolveError::InvalidFunction(_)
        | ResolveError::MissingParameters(_)
        | ResolveError::UnknownToken { .. }
        | ResolveError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
