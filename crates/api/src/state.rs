//! Shared application state.

use nlswap_data::PoolCatalog;
use nlswap_execution::ActionExecutor;
use nlswap_protocols::{ContractReader, SwapLogSource};
use nlswap_resolver::{
    ActionResolver, CompletionClient, CompletionError, CompletionOverrides, CompletionSettings,
};
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<PoolCatalog>,
    /// Reader for account state (allowances, LP balances).
    pub reader: Arc<dyn ContractReader>,
    pub swap_logs: Arc<dyn SwapLogSource>,
    pub executor: ActionExecutor,
    pub completion: CompletionSettings,
    /// Fixed completion backend; replaces the configured chain when set.
    completion_client: Option<Arc<dyn CompletionClient>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<PoolCatalog>,
        reader: Arc<dyn ContractReader>,
        swap_logs: Arc<dyn SwapLogSource>,
        executor: ActionExecutor,
        completion: CompletionSettings,
    ) -> Self {
        Self {
            catalog,
            reader,
            swap_logs,
            executor,
            completion,
            completion_client: None,
        }
    }

    /// Uses `client` for every resolution, ignoring per-request overrides.
    #[must_use]
    pub fn with_completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion_client = Some(client);
        self
    }

    /// Builds a resolver for one request.
    ///
    /// # Errors
    /// Returns [`CompletionError::NotConfigured`] if neither the request nor the
    /// configuration names a completion backend.
    pub fn resolver(
        &self,
        overrides: &CompletionOverrides,
    ) -> Result<ActionResolver, CompletionError> {
        let client = match &self.completion_client {
            Some(client) => client.clone(),
            None => self.completion.client(overrides)?,
        };
        Ok(ActionResolver::new(client))
    }
}
