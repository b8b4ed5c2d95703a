use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("save request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("save endpoint returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),
}

/// Client for the downstream service of record.
#[derive(Clone)]
pub struct SaveClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl SaveClient {
    pub fn new(url: Url, timeout: Duration) -> Self {
        SaveClient {
            client: reqwest::Client::new(),
            url,
            timeout,
        }
    }

    /// POSTs the processed result as JSON. The timeout covers the whole
    /// exchange; any non-2xx answer counts as a failed save.
    pub async fn save(&self, processed: &Value) -> Result<(), SaveError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(processed)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SaveError::UpstreamStatus(status));
        }

        Ok(())
    }
}
