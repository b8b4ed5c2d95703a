use crate::payload::Payload;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Secret cannot be empty")]
    EmptySecret,

    #[error("Timeout cannot be 0: {0}")]
    InvalidTimeout(&'static str),

    #[error("Task queue needs at least one worker")]
    InvalidWorkers,

    #[error("Task queue size cannot be 0")]
    InvalidQueueSize,
}

/// Where the `/run` handler takes its payload from
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    /// The configured `payload` is used for every request
    #[default]
    Fixed,
    /// The request body is parsed as a JSON payload
    RequestBody,
}

/// Client service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming requests
    #[serde(default)]
    pub listener: Listener,
    /// Bearer token expected in the `Authorization` header
    pub secret: String,
    #[serde(default)]
    pub payload_source: PayloadSource,
    /// Payload used when `payload_source` is `fixed`
    #[serde(default)]
    pub payload: Payload,
    /// Directory alert reports are written to
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    #[serde(default)]
    pub task_queue: TaskQueueConfig,
    /// Upper bound on waiting for a processing task result
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    /// Downstream save endpoint
    pub save: SaveConfig,
}

impl Config {
    /// Validates the client service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.secret.is_empty() {
            return Err(ValidationError::EmptySecret);
        }

        if self.task_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("task_timeout_secs"));
        }

        self.task_queue.validate()?;
        self.save.validate()?;

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Backend used to run processing tasks
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum TaskQueueConfig {
    /// In-process queue drained by a bounded set of workers
    Local {
        #[serde(default = "default_workers")]
        workers: usize,
        #[serde(default = "default_queue_size")]
        queue_size: usize,
    },
    /// Remote processing service reached over HTTP
    Http { url: Url },
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        TaskQueueConfig::Local {
            workers: default_workers(),
            queue_size: default_queue_size(),
        }
    }
}

impl TaskQueueConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let TaskQueueConfig::Local {
            workers,
            queue_size,
        } = self
        {
            if *workers == 0 {
                return Err(ValidationError::InvalidWorkers);
            }
            if *queue_size == 0 {
                return Err(ValidationError::InvalidQueueSize);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SaveConfig {
    /// URL processed results are POSTed to
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub url: Url,
    #[serde(default = "default_save_timeout_secs")]
    pub timeout_secs: u64,
}

impl SaveConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("save.timeout_secs"));
        }
        Ok(())
    }
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("alert_reports")
}

fn default_task_timeout_secs() -> u64 {
    5
}

fn default_save_timeout_secs() -> u64 {
    2
}

fn default_workers() -> usize {
    4
}

fn default_queue_size() -> usize {
    64
}
