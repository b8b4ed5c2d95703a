pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod payload;
pub mod relay;
pub mod report;
pub mod save;
pub mod scanner;
pub mod service;
pub mod task_queue;

#[cfg(test)]
mod testutils;

use crate::errors::RelayError;
use crate::relay::Relay;
use crate::service::ClientService;
use shared::http::run_http_service;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Prepares the report directory, binds the listener and serves until
/// `shutdown` resolves.
pub async fn run<F>(config: config::Config, shutdown: F) -> Result<(), RelayError>
where
    F: Future<Output = ()>,
{
    let relay = Relay::from_config(&config);
    relay.reports().ensure_dir().await?;

    let service = ClientService::new(Arc::new(relay), config.payload_source, config.payload);

    let listener = TcpListener::bind((config.listener.host.as_str(), config.listener.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        report_dir = %config.report_dir.display(),
        "Client service listening"
    );

    run_http_service(listener, service, shutdown).await?;
    Ok(())
}
