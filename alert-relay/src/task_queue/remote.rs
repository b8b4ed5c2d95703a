use super::{PendingTask, TaskError, TaskQueue, TaskResult};
use crate::payload::Payload;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

/// Hands payloads to a remote processing service. The service answers the
/// POST with the processed result as JSON.
///
/// Each request is bounded by `request_timeout`, so a hung service cannot
/// hold the spawned request past that, even after the caller gave up.
pub struct HttpTaskQueue {
    client: reqwest::Client,
    url: Url,
    request_timeout: Duration,
}

impl HttpTaskQueue {
    pub fn new(url: Url, request_timeout: Duration) -> Self {
        HttpTaskQueue {
            client: reqwest::Client::new(),
            url,
            request_timeout,
        }
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn submit(&self, payload: Payload) -> Result<PendingTask, TaskError> {
        let (reply, receiver) = oneshot::channel();
        let client = self.client.clone();
        let url = self.url.clone();
        let request_timeout = self.request_timeout;

        tokio::spawn(async move {
            let result = process_remote(&client, url, request_timeout, &payload).await;
            let _ = reply.send(result);
        });

        Ok(PendingTask::new(receiver))
    }
}

async fn process_remote(
    client: &reqwest::Client,
    url: Url,
    request_timeout: Duration,
    payload: &Payload,
) -> TaskResult {
    let response = client
        .post(url)
        .json(payload)
        .timeout(request_timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TaskError::UpstreamStatus(status));
    }

    Ok(response.json::<Value>().await?)
}
