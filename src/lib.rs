pub mod api;
pub mod appointments;
pub mod config;
pub mod gateway;
pub mod graph;
pub mod models;
pub mod scheduler;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, ApiServer};
use crate::appointments::AppointmentStore;
use crate::config::ServerConfig;
use crate::gateway::{GatewayError, HttpRecordGateway};
use crate::graph::GraphService;
use crate::scheduler::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Record service unusable: {0}")]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Wire the gateway, appointment store and GraphQL service together and
/// start serving on `config.bind_addr()`.
pub async fn start(config: &ServerConfig) -> Result<ApiServer, AppError> {
    let gateway = HttpRecordGateway::new(&config.record_api_url, config.record_api_timeout)?;
    let retry = RetryPolicy::new(config.max_attempts, config.retry_backoff);
    let graph = GraphService::new(Arc::new(gateway), Arc::new(AppointmentStore::new()), retry);

    let server = api::start_api_server(ApiContext::new(graph), config.bind_addr()).await?;
    tracing::info!(
        addr = %server.addr,
        record_api = %config.record_api_url,
        timeout_ms = config.record_api_timeout.as_millis() as u64,
        max_attempts = config.max_attempts,
        "GraphQL endpoint ready at http://{}/graphql",
        server.addr
    );
    Ok(server)
}

/// Process entry point: init logging, read config, serve until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    let server = start(&config).await?;

    tokio::signal::ctrl_c().await.map_err(AppError::Signal)?;
    tracing::info!("Shutdown requested");
    server.stop().await?;
    Ok(())
}
