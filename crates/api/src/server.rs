//! Server configuration and startup.

use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Listen address of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl ServerConfig {
    /// Reads `NLSWAP_HOST` and `NLSWAP_PORT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("NLSWAP_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: std::env::var("NLSWAP_PORT")
                .ok()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP server over [`AppState`].
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serves until Ctrl-C.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        let local: SocketAddr = listener.local_addr()?;
        info!(address = %local, "API server listening");

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_address() {
        assert_eq!(ServerConfig::default().bind_address(), "127.0.0.1:3001");
    }
}
