use crate::config::PayloadSource;
use crate::errors::RelayError;
use crate::metrics_defs::RUN_REQUESTS;
use crate::payload::Payload;
use crate::relay::Relay;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::AUTHORIZATION;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use shared::counter;
use shared::http::{ResponseBody, json_response, make_detail_response, make_error_response};
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const SERVICE_MESSAGE: &str = "Client service - connecting the services";

pub struct ClientService {
    relay: Arc<Relay>,
    payload_source: PayloadSource,
    fixed_payload: Arc<Payload>,
}

impl ClientService {
    pub fn new(relay: Arc<Relay>, payload_source: PayloadSource, fixed_payload: Payload) -> Self {
        ClientService {
            relay,
            payload_source,
            fixed_payload: Arc::new(fixed_payload),
        }
    }
}

impl<B> Service<Request<B>> for ClientService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let relay = self.relay.clone();
        let payload_source = self.payload_source;
        let fixed_payload = self.fixed_payload.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            let res = match (&method, path.as_str()) {
                (&Method::GET, "/") => {
                    json_response(StatusCode::OK, &json!({ "message": SERVICE_MESSAGE }))
                }
                (&Method::GET, "/health") => {
                    json_response(StatusCode::OK, &json!({ "status": "OK" }))
                }
                (&Method::POST, "/run") => {
                    handle_run(&relay, payload_source, &fixed_payload, req).await
                }
                (_, "/" | "/health" | "/run") => {
                    make_error_response(StatusCode::METHOD_NOT_ALLOWED)
                }
                _ => make_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}

async fn handle_run<B>(
    relay: &Relay,
    payload_source: PayloadSource,
    fixed_payload: &Payload,
    req: Request<B>,
) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Display,
{
    tracing::info!("Received request at /run endpoint");

    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = relay.authorize(authorization) {
        return error_response(&e);
    }

    let payload = match payload_source {
        PayloadSource::Fixed => fixed_payload.clone(),
        PayloadSource::RequestBody => match read_payload(req.into_body()).await {
            Ok(payload) => payload,
            Err(e) => return error_response(&e),
        },
    };

    match relay.process(&payload).await {
        Ok(outcome) => {
            counter!(RUN_REQUESTS, "outcome" => outcome.as_str()).increment(1);
            json_response(StatusCode::OK, &outcome.to_json())
        }
        Err(e) => error_response(&e),
    }
}

async fn read_payload<B>(body: B) -> Result<Payload, RelayError>
where
    B: Body,
    B::Error: Display,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| RelayError::InvalidPayload(e.to_string()))?
        .to_bytes();
    serde_json::from_slice(&bytes).map_err(|e| RelayError::InvalidPayload(e.to_string()))
}

fn error_response(error: &RelayError) -> Response<ResponseBody> {
    let (outcome, res) = match error {
        RelayError::Unauthorized => (
            "unauthorized",
            make_detail_response(StatusCode::UNAUTHORIZED, &error.to_string()),
        ),
        RelayError::InvalidPayload(_) => (
            "invalid_payload",
            make_detail_response(StatusCode::BAD_REQUEST, &error.to_string()),
        ),
        _ => {
            tracing::error!(error = %error, "Request to /run failed");
            (
                "error",
                make_error_response(StatusCode::INTERNAL_SERVER_ERROR),
            )
        }
    };
    counter!(RUN_REQUESTS, "outcome" => outcome).increment(1);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportWriter;
    use crate::save::SaveClient;
    use crate::task_queue::{LocalTaskQueue, StatusProcessor};
    use crate::testutils::TestServer;
    use http_body_util::Full;
    use hyper::body::Bytes;
    use serde_json::Value;
    use std::time::Duration;

    fn make_service(
        save: &TestServer,
        report_dir: &std::path::Path,
        source: PayloadSource,
    ) -> ClientService {
        let relay = Relay::new(
            "Secret123",
            ReportWriter::new(report_dir),
            Arc::new(LocalTaskQueue::new(Arc::new(StatusProcessor), 1, 8)),
            Duration::from_secs(5),
            SaveClient::new(save.url("/save"), Duration::from_secs(2)),
        );
        ClientService::new(
            Arc::new(relay),
            source,
            Payload::new("A", "a@b.com", "+380123456789"),
        )
    }

    fn request(
        method: Method,
        path: &str,
        authorization: Option<&str>,
        body: &str,
    ) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    async fn send(service: &ClientService, req: Request<Full<Bytes>>) -> (StatusCode, Value) {
        let response = service.call(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_static_routes() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::Fixed);

        let (status, body) = send(&service, request(Method::GET, "/", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Client service - connecting the services"})
        );

        let (status, body) = send(&service, request(Method::GET, "/health", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK"}));

        let (status, body) = send(&service, request(Method::GET, "/missing", None, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));

        let (status, _) = send(&service, request(Method::GET, "/run", None, "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_run_requires_bearer_secret() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::Fixed);

        for authorization in [None, Some("Bearer wrong")] {
            let (status, body) =
                send(&service, request(Method::POST, "/run", authorization, "")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({"detail": "Unauthorized"}));
        }
        assert!(save.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_with_fixed_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::Fixed);

        // The body is ignored when the payload is fixed
        let (status, body) = send(
            &service,
            request(Method::POST, "/run", Some("Bearer Secret123"), "ignored"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"result": {"name": "A", "status": "processed"}})
        );
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_run_with_request_body() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::RequestBody);

        let (status, body) = send(
            &service,
            request(
                Method::POST,
                "/run",
                Some("Bearer Secret123"),
                r#"{"name": "B", "email": "nobody", "phone": "12345"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"result": {"name": "B", "status": "processed"}})
        );
        // Nothing sensitive, so no report
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_run_with_invalid_body() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::RequestBody);

        let (status, body) = send(
            &service,
            request(Method::POST, "/run", Some("Bearer Secret123"), "{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .starts_with("Invalid payload")
        );
        assert!(save.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_checks_auth_before_reading_body() {
        let tmp = tempfile::tempdir().unwrap();
        let save = TestServer::spawn(StatusCode::OK, json!({})).await;
        let service = make_service(&save, tmp.path(), PayloadSource::RequestBody);

        for authorization in [None, Some("Bearer wrong")] {
            let (status, body) = send(
                &service,
                request(Method::POST, "/run", authorization, "{not json"),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({"detail": "Unauthorized"}));
        }

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(save.requests().is_empty());
    }
}
