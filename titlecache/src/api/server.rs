//! API server for the title cache

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use titlecache_core::TitleCache;

use super::routes::{action_form, action_query, health_check, AppState};

/// Configuration for the API server
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    service: TitleCache,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig, service: TitleCache) -> Self {
        Self { config, service }
    }

    /// Build the router; every origin may call it
    pub fn router(service: TitleCache) -> Router {
        let app_state = Arc::new(AppState { service });

        Router::new()
            .route("/", get(action_query).post(action_form))
            .route("/health", get(health_check))
            .with_state(app_state)
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until the process exits
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Starting API server on {}", listener.local_addr()?);
        axum::serve(listener, Self::router(self.service)).await?;
        Ok(())
    }
}
