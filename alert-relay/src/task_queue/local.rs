use super::{PendingTask, TaskError, TaskQueue, TaskResult};
use crate::payload::Payload;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc, oneshot};

/// Turns a payload into a processed result.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, payload: Payload) -> TaskResult;
}

/// Marks the payload as processed, keeping only the name.
pub struct StatusProcessor;

#[async_trait]
impl Processor for StatusProcessor {
    async fn process(&self, payload: Payload) -> TaskResult {
        Ok(json!({
            "name": payload.name,
            "status": "processed",
        }))
    }
}

struct Job {
    payload: Payload,
    reply: oneshot::Sender<TaskResult>,
}

/// In-process task queue. A dispatcher drains the channel and runs at most
/// `workers` jobs at a time.
pub struct LocalTaskQueue {
    sender: mpsc::Sender<Job>,
}

impl LocalTaskQueue {
    /// Must be called from within a tokio runtime.
    pub fn new(processor: Arc<dyn Processor>, workers: usize, queue_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_size);
        tokio::spawn(run_dispatcher(receiver, processor, workers));
        LocalTaskQueue { sender }
    }
}

#[async_trait]
impl TaskQueue for LocalTaskQueue {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn submit(&self, payload: Payload) -> Result<PendingTask, TaskError> {
        let (reply, receiver) = oneshot::channel();

        self.sender
            .try_send(Job { payload, reply })
            .map_err(|e| match e {
                TrySendError::Full(_) => TaskError::QueueFull,
                TrySendError::Closed(_) => TaskError::QueueClosed,
            })?;

        Ok(PendingTask::new(receiver))
    }
}

async fn run_dispatcher(
    mut receiver: mpsc::Receiver<Job>,
    processor: Arc<dyn Processor>,
    workers: usize,
) {
    let permits = Arc::new(Semaphore::new(workers));

    while let Some(job) = receiver.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let processor = processor.clone();

        tokio::spawn(async move {
            let result = processor.process(job.payload).await;
            // The submitter may have stopped waiting already
            let _ = job.reply.send(result);
            drop(permit);
        });
    }

    tracing::debug!("Task queue closed, dispatcher exiting");
}
