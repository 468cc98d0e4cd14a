//! Web server implementation using Axum

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main repolens web server
pub struct RepolensServer {
    config: WebConfig,
    state: AppState,
}

impl RepolensServer {
    /// Create a new server from configuration and prepared state
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the web server; blocks until shutdown
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        let app = create_app(self.state);

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }
}
