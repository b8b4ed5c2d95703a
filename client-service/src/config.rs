use alert_relay::config::Config as ClientServiceConfig;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,
    /// Logs go to `<log_dir>/app.log`; stdout when unset
    #[serde(default = "default_log_dir")]
    pub log_dir: Option<PathBuf>,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            log_dir: default_log_dir(),
            sentry_dsn: None,
        }
    }
}

impl LoggingConfig {
    /// The parsed sentry DSN, if one is configured.
    pub fn dsn(&self) -> Result<Option<sentry::types::Dsn>, sentry::types::ParseDsnError> {
        self.sentry_dsn.as_deref().map(str::parse).transpose()
    }
}

fn default_level() -> String {
    "info".into()
}

fn default_log_dir() -> Option<PathBuf> {
    Some(PathBuf::from("logs"))
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub client_service: ClientServiceConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
