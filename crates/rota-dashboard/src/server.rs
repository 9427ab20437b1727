//! Dashboard server configuration and startup

use std::net::SocketAddr;

use axum::Router;
use rota_core::{AvailabilityPage, ServerConfig};
use tracing::info;

use crate::api::{create_router, Clock, DashboardState};
use crate::error::{DashboardError, Result};

/// Dashboard server configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl From<&ServerConfig> for DashboardConfig {
    fn from(config: &ServerConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}

impl DashboardConfig {
    /// Create a new configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| DashboardError::ConfigError(format!("Invalid address: {}", e)))
    }
}

/// Dashboard server
pub struct DashboardServer {
    config: DashboardConfig,
    state: DashboardState,
}

impl DashboardServer {
    /// Create a new dashboard server around one page session
    pub fn new(config: DashboardConfig, page: AvailabilityPage) -> Self {
        Self {
            config,
            state: DashboardState::new(page),
        }
    }

    /// Refresh the page's date from `clock` on each request
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.state = self.state.with_clock(clock);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Get the router
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Load initial data and start the server
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;

        self.state.prime().await;
        let app = self.router();

        info!("Dashboard server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| DashboardError::ServerError(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| DashboardError::ServerError(format!("Server error: {}", e)))?;

        Ok(())
    }
}
