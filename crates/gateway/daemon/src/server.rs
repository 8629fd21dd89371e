//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::sim::{build_provider, SimNetwork};
use gateway_commit::Gateway;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Gateway daemon server
pub struct Server {
    config: DaemonConfig,
    gateway: Arc<Gateway>,
}

impl Server {
    /// Create a new server backed by the simulated network in `config`
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        if config.network.organizations.is_empty() {
            return Err(DaemonError::Config(
                "at least one organization must be configured".to_string(),
            ));
        }

        let network = Arc::new(SimNetwork::new(&config.network));
        let provider = build_provider(&config.network, network);
        let gateway = Arc::new(Gateway::new(Arc::new(provider), config.commit.clone()));

        Ok(Self { config, gateway })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.gateway.clone());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Gateway daemon listening on {}", addr);
        tracing::info!(
            organizations = self.config.network.organizations.len(),
            channels = ?self.config.network.channels,
            "Simulated network ready"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Gateway daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
