use http::StatusCode;
use http_body_util::BodyExt;
use hyper::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use serde_json::Value;
use shared::http::{json_response, run_http_service};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

/// Stand-in for the save endpoint and the remote processing service. Answers
/// every request with a fixed JSON body and records the JSON bodies it gets.
pub struct TestServer {
    base_url: Url,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn(status: StatusCode, body: Value) -> Self {
        Self::spawn_delayed(status, body, Duration::ZERO).await
    }

    pub async fn spawn_delayed(status: StatusCode, body: Value, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let base_url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let recorded = requests.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let recorded = recorded.clone();
            let body = body.clone();
            async move {
                let bytes = req
                    .into_body()
                    .collect()
                    .await
                    .map(|collected| collected.to_bytes())
                    .unwrap_or_default();
                if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
                    recorded.lock().unwrap().push(value);
                }
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(json_response(status, &body))
            }
        });

        tokio::spawn(run_http_service(listener, service, async move {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            base_url,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A URL nothing is listening on.
pub fn unused_url(path: &str) -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}{path}")).unwrap()
}
