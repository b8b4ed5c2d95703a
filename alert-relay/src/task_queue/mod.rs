//! Hand-off of payloads to the processing task.
//!
//! Submitting returns a [`PendingTask`] right away; the caller decides how
//! long it is willing to wait for the result. Giving up on a pending task
//! does not cancel the work behind it.

mod local;
mod remote;

pub use self::local::{LocalTaskQueue, Processor, StatusProcessor};
pub use self::remote::HttpTaskQueue;

use crate::config::TaskQueueConfig;
use crate::payload::Payload;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    #[error("task queue is full")]
    QueueFull,

    #[error("task queue is closed")]
    QueueClosed,

    #[error("no result within {0:?}")]
    Timeout(Duration),

    #[error("worker dropped the task without a result")]
    WorkerDropped,

    #[error("processing failed: {0}")]
    Processor(String),

    #[error("processing service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("processing service returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),
}

pub type TaskResult = Result<Value, TaskError>;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    fn name(&self) -> &'static str;

    /// Queues the payload for processing. Only fails when the task could not
    /// be handed off at all.
    async fn submit(&self, payload: Payload) -> Result<PendingTask, TaskError>;
}

/// The receiving end of a submitted task.
pub struct PendingTask {
    receiver: oneshot::Receiver<TaskResult>,
}

impl PendingTask {
    pub fn new(receiver: oneshot::Receiver<TaskResult>) -> Self {
        PendingTask { receiver }
    }

    /// Waits at most `limit` for the task result.
    pub async fn wait(self, limit: Duration) -> TaskResult {
        match timeout(limit, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TaskError::WorkerDropped),
            Err(_) => Err(TaskError::Timeout(limit)),
        }
    }
}

/// `task_timeout` also bounds each request of the HTTP backend.
pub fn from_config(config: &TaskQueueConfig, task_timeout: Duration) -> Arc<dyn TaskQueue> {
    match config {
        TaskQueueConfig::Local {
            workers,
            queue_size,
        } => Arc::new(LocalTaskQueue::new(
            Arc::new(StatusProcessor),
            *workers,
            *queue_size,
        )),
        TaskQueueConfig::Http { url } => Arc::new(HttpTaskQueue::new(url.clone(), task_timeout)),
    }
}
