//! Text-completion collaborators.
//!
//! Two endpoint shapes are supported: an OpenAI-compatible chat-completions API
//! and a generic custom endpoint. Whatever envelope a backend answers with is
//! normalised into a [`CompletionResult`] here, so the resolver never looks at
//! the wire shape.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Sampling temperature used for action resolution.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Failures talking to a completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("LLM service is not configured. Please provide an OpenAI API key.")]
    NotConfigured,
    #[error("The language model API key is invalid or expired")]
    Unauthorized,
    #[error("Language model rate limit exceeded or quota exhausted")]
    RateLimited,
    #[error("Language model API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("Error calling language model API: {0}")]
    Network(String),
    #[error("Language model returned an empty response")]
    Empty,
}

impl CompletionError {
    /// Transport failures and non-2xx answers justify trying the fallback.
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status { .. } | Self::Unauthorized | Self::RateLimited
        )
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            _ => Self::Status {
                status: status.as_u16(),
                body: body.chars().take(100).collect(),
            },
        }
    }
}

/// What the resolver sends to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub temperature: f32,
}

impl CompletionRequest {
    fn messages(&self) -> Value {
        json!([
            { "role": "system", "content": self.system_prompt },
            { "role": "user", "content": self.user_text },
        ])
    }
}

/// Normalised backend answer: the raw text expected to hold one JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub content: String,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Response envelopes seen from completion backends.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionEnvelope {
    Chat { choices: Vec<ChatChoice> },
    Response { response: Value },
    Output { output: Value },
    Bare(String),
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Normalises a raw response body into a [`CompletionResult`].
///
/// Bodies that are not JSON at all are taken as bare text.
///
/// # Errors
/// Returns [`CompletionError::Empty`] if no content can be found.
pub fn normalize_response(body: &str) -> Result<CompletionResult, CompletionError> {
    let content = match serde_json::from_str::<CompletionEnvelope>(body) {
        Ok(CompletionEnvelope::Chat { choices }) => choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default(),
        Ok(CompletionEnvelope::Response { response }) => value_text(response),
        Ok(CompletionEnvelope::Output { output }) => value_text(output),
        Ok(CompletionEnvelope::Bare(text)) => text,
        Err(_) => body.to_string(),
    };

    if content.trim().is_empty() {
        return Err(CompletionError::Empty);
    }
    Ok(CompletionResult { content })
}

async fn post_json(
    http: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
) -> Result<CompletionResult, CompletionError> {
    let mut request = http.post(url).json(body);
    if let Some(key) = bearer {
        request = request.bearer_auth(key);
    }
    let response = request
        .send()
        .await
        .map_err(|e| CompletionError::Network(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| CompletionError::Network(e.to_string()))?;

    if !status.is_success() {
        warn!(url, status = status.as_u16(), "Completion endpoint returned an error");
        return Err(CompletionError::from_status(status, &text));
    }
    normalize_response(&text)
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiCompletionClient {
    http: Client,
    base_url: String,
    api_key: Zeroizing<String>,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: Zeroizing<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": request.messages(),
            "temperature": request.temperature,
            "response_format": { "type": "json_object" },
        });
        debug!(model = %self.model, "Calling chat completions");
        post_json(&self.http, &self.endpoint(), Some(self.api_key.as_str()), &body).await
    }
}

/// Generic custom endpoint taking `{messages, temperature}`.
pub struct CustomEndpointClient {
    http: Client,
    url: String,
}

impl CustomEndpointClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for CustomEndpointClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        let body = json!({
            "messages": request.messages(),
            "temperature": request.temperature,
        });
        debug!(url = %self.url, "Calling custom completion endpoint");
        post_json(&self.http, &self.url, None, &body).await
    }
}

/// A primary backend with one fallback attempt.
///
/// The fallback is tried once, and only when the primary fails at the endpoint
/// level (network error or non-2xx). This is the only retry in the system.
pub struct FallbackCompletion {
    primary: Arc<dyn CompletionClient>,
    fallback: Arc<dyn CompletionClient>,
}

impl FallbackCompletion {
    pub fn new(primary: Arc<dyn CompletionClient>, fallback: Arc<dyn CompletionClient>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl CompletionClient for FallbackCompletion {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, CompletionError> {
        match self.primary.complete(request).await {
            Err(e) if e.is_endpoint_failure() => {
                warn!(error = %e, "Primary completion endpoint failed, trying fallback");
                self.fallback.complete(request).await
            }
            other => other,
        }
    }
}

/// Per-request overrides supplied by the caller.
#[derive(Clone, Default)]
pub struct CompletionOverrides {
    pub api_key: Option<Zeroizing<String>>,
    pub custom_endpoint: Option<String>,
}

impl std::fmt::Debug for CompletionOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOverrides")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("custom_endpoint", &self.custom_endpoint)
            .finish()
    }
}

/// Completion configuration.
#[derive(Clone)]
pub struct CompletionSettings {
    pub openai_api_key: Option<Zeroizing<String>>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Primary custom endpoint; the OpenAI-compatible endpoint is its fallback.
    pub custom_endpoint: Option<String>,
    pub request_timeout: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            custom_endpoint: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("custom_endpoint", &self.custom_endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CompletionSettings {
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` and
    /// `CUSTOM_COMPLETION_URL`; unset or empty variables keep their defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            openai_api_key: var("OPENAI_API_KEY").map(Zeroizing::new),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            custom_endpoint: var("CUSTOM_COMPLETION_URL"),
            request_timeout: defaults.request_timeout,
        }
    }

    /// Builds the client chain for one request.
    ///
    /// A caller-supplied key or endpoint replaces the configured one. With both
    /// a custom endpoint and an API key, the custom endpoint is primary and
    /// OpenAI the fallback.
    ///
    /// # Errors
    /// Returns [`CompletionError::NotConfigured`] when neither is available, or
    /// [`CompletionError::Network`] if the HTTP client cannot be built.
    pub fn client(
        &self,
        overrides: &CompletionOverrides,
    ) -> Result<Arc<dyn CompletionClient>, CompletionError> {
        let http = Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let api_key = overrides
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.openai_api_key.clone());
        let custom = overrides
            .custom_endpoint
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.custom_endpoint.clone());

        let openai = api_key.map(|key| -> Arc<dyn CompletionClient> {
            Arc::new(OpenAiCompletionClient::new(
                http.clone(),
                &self.openai_base_url,
                key,
                &self.openai_model,
            ))
        });
        let custom = custom.map(|url| -> Arc<dyn CompletionClient> {
            Arc::new(CustomEndpointClient::new(http.clone(), url))
        });

        match (custom, openai) {
            (Some(custom), Some(openai)) => {
                info!("Using custom completion endpoint with OpenAI fallback");
                Ok(Arc::new(FallbackCompletion::new(custom, openai)))
            }
            (Some(custom), None) => Ok(custom),
            (None, Some(openai)) => Ok(openai),
            (None, None) => Err(CompletionError::NotConfigured),
        }
    }
}
