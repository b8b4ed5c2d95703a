mod config;
mod logging;
mod statsd;

use clap::{Args, Parser};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "client-service", about = "Scans, processes and relays payloads")]
enum CliCommand {
    /// Run the client service
    Run(ConfigArgs),
    /// Load and validate a config file, then print it
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, short, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("invalid config: {0}")]
    Validation(#[from] alert_relay::config::ValidationError),
    #[error("invalid logging config: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not initialize logging: {0}")]
    Logging(#[from] logging::LoggingError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error("service error: {0}")]
    Service(#[from] alert_relay::errors::RelayError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match &cli {
        CliCommand::Run(args) => run(args),
        CliCommand::CheckConfig(args) => check_config(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("client-service: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, CliError> {
    let config = Config::from_file(&args.config)?;
    config.client_service.validate()?;
    config.common.logging.dsn()?;
    Ok(config)
}

fn check_config(args: &ConfigArgs) -> Result<(), CliError> {
    let config = load_config(args)?;
    println!("{config:#?}");
    Ok(())
}

fn run(args: &ConfigArgs) -> Result<(), CliError> {
    let config = load_config(args)?;

    // Sentry must be initialized before the runtime starts
    let _sentry_guard = logging::init(&config.common.logging)?;

    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    tracing::info!(config = %args.config.display(), "Starting client service");
    runtime.block_on(alert_relay::run(config.client_service, shutdown_signal()))?;
    tracing::info!("Client service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
