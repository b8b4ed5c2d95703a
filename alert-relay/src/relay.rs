//! The `/run` pipeline.
//!
//! ```text
//! AUTH_CHECK ─(mismatch)─> Unauthorized
//!     │
//! SCAN_AND_ALERT
//!     │
//! SUBMIT_TASK ─(error / timeout)─> ProcessingUnavailable
//!     │
//! SAVE ─(error / timeout)─> SaveFailed
//!     │
//! Processed
//! ```
//!
//! Every exit is terminal for the request. Nothing is retried and nothing is
//! carried over between requests.

use crate::config::Config;
use crate::errors::{RelayError, Result};
use crate::metrics_defs::{ALERTS_TRIGGERED, SAVE_DURATION, TASK_DURATION};
use crate::payload::Payload;
use crate::report::ReportWriter;
use crate::save::SaveClient;
use crate::scanner;
use crate::task_queue::{self, TaskQueue, TaskResult};
use serde_json::{Value, json};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const PROCESSING_UNAVAILABLE_MESSAGE: &str = "The BS not responding";
pub const SAVE_FAILED_MESSAGE: &str = "Save operation at failed";

/// How a request that got past authorization ended.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// Processed and saved; carries the task result untouched
    Processed(Value),
    /// The task failed, timed out or could not be submitted
    ProcessingUnavailable,
    /// The task succeeded but the save call did not
    SaveFailed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Processed(_) => "processed",
            RunOutcome::ProcessingUnavailable => "processing_unavailable",
            RunOutcome::SaveFailed => "save_failed",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RunOutcome::Processed(processed) => json!({ "result": processed }),
            RunOutcome::ProcessingUnavailable => json!({ "error": PROCESSING_UNAVAILABLE_MESSAGE }),
            RunOutcome::SaveFailed => json!({ "error": SAVE_FAILED_MESSAGE }),
        }
    }
}

pub struct Relay {
    expected_authorization: String,
    reports: ReportWriter,
    task_queue: Arc<dyn TaskQueue>,
    task_timeout: Duration,
    save_client: SaveClient,
}

impl Relay {
    pub fn new(
        secret: &str,
        reports: ReportWriter,
        task_queue: Arc<dyn TaskQueue>,
        task_timeout: Duration,
        save_client: SaveClient,
    ) -> Self {
        Relay {
            expected_authorization: format!("Bearer {secret}"),
            reports,
            task_queue,
            task_timeout,
            save_client,
        }
    }

    /// Must be called from within a tokio runtime when the local task queue
    /// is configured.
    pub fn from_config(config: &Config) -> Self {
        let task_timeout = Duration::from_secs(config.task_timeout_secs);
        Relay::new(
            &config.secret,
            ReportWriter::new(&config.report_dir),
            task_queue::from_config(&config.task_queue, task_timeout),
            task_timeout,
            SaveClient::new(
                config.save.url.clone(),
                Duration::from_secs(config.save.timeout_secs),
            ),
        )
    }

    pub fn reports(&self) -> &ReportWriter {
        &self.reports
    }

    /// Accepts only `Bearer <secret>`, compared as a whole.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<()> {
        if authorization != Some(self.expected_authorization.as_str()) {
            tracing::warn!("Access attempt is unauthorized");
            return Err(RelayError::Unauthorized);
        }

        tracing::info!("Successful authorization");
        Ok(())
    }

    /// Authorizes and processes in one call. The HTTP service calls
    /// [`Relay::authorize`] and [`Relay::process`] separately so a request
    /// body is only read once authorized; `run.requests` is counted there.
    pub async fn run(&self, authorization: Option<&str>, payload: &Payload) -> Result<RunOutcome> {
        self.authorize(authorization)?;
        self.process(payload).await
    }

    /// Everything after authorization. Errors here are unexpected failures
    /// (report I/O, serialization), not relay outcomes.
    pub async fn process(&self, payload: &Payload) -> Result<RunOutcome> {
        let payload_text = payload.text()?;
        tracing::info!(payload = %payload_text, "Data to process");

        let alert_type = scanner::classify(&payload_text);
        if alert_type.is_alert() {
            let path = self.reports.write(alert_type, &payload_text).await?;
            counter!(ALERTS_TRIGGERED, "type" => alert_type.as_str()).increment(1);
            tracing::warn!(
                alert_type = %alert_type,
                report = %path.display(),
                "ALERT triggered, report saved"
            );
        }

        let started = Instant::now();
        let task_result = self.submit_and_wait(payload.clone()).await;
        histogram!(TASK_DURATION).record(started.elapsed().as_secs_f64());

        let processed = match task_result {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(
                    queue = self.task_queue.name(),
                    error = %e,
                    "Unable to contact processing service"
                );
                return Ok(RunOutcome::ProcessingUnavailable);
            }
        };
        tracing::info!(processed = %processed, "Processed data");

        let started = Instant::now();
        let save_result = self.save_client.save(&processed).await;
        histogram!(SAVE_DURATION).record(started.elapsed().as_secs_f64());

        if let Err(e) = save_result {
            tracing::error!(error = %e, "Unable to save data");
            return Ok(RunOutcome::SaveFailed);
        }

        tracing::info!("The data is saved, returning result");
        Ok(RunOutcome::Processed(processed))
    }

    async fn submit_and_wait(&self, payload: Payload) -> TaskResult {
        self.task_queue
            .submit(payload)
            .await?
            .wait(self.task_timeout)
            .await
    }
}
