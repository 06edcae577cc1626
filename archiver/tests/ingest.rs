use std::sync::{Arc, Mutex};

use archiver::api::IngestError;
use archiver::key::ObjectKey;
use archiver::router::router;
use archiver::sinks::store::ObjectStoreSink;
use archiver::sinks::ObjectSink;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use base64::Engine;
use bytes::Bytes;
use http_body_util::BodyExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

const MAX_BODY_SIZE: usize = 1_000_000;

#[derive(Clone, Default)]
struct MemorySink {
    objects: Arc<Mutex<Vec<(String, Bytes)>>>,
}

impl MemorySink {
    fn objects(&self) -> Vec<(String, Bytes)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectSink for MemorySink {
    async fn write(&self, key: &ObjectKey, data: Bytes) -> Result<(), IngestError> {
        self.objects.lock().unwrap().push((key.to_string(), data));
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Failure {
    Write,
    Close,
}

struct FailingSink {
    failure: Failure,
}

#[async_trait]
impl ObjectSink for FailingSink {
    async fn write(&self, _key: &ObjectKey, _data: Bytes) -> Result<(), IngestError> {
        match self.failure {
            Failure::Write => Err(IngestError::StorageWriteError),
            Failure::Close => Err(IngestError::StorageCloseError),
        }
    }
}

fn log_entry(tenant_id: &str, job_id: &str, timestamp: &str) -> String {
    json!({
        "insertId": "1x2y3z",
        "jsonPayload": {"tenant_id": tenant_id, "job_id": job_id, "message": "job finished"},
        "logName": "projects/p/logs/worker",
        "receiveTimestamp": timestamp,
        "severity": "INFO"
    })
    .to_string()
}

fn push_body(data: &[u8]) -> String {
    json!({
        "message": {
            "data": base64::engine::general_purpose::STANDARD.encode(data),
            "messageId": "9876",
            "publishTime": "2025-03-14T15:09:27Z"
        },
        "subscription": "projects/p/subscriptions/log-archive"
    })
    .to_string()
}

fn binary_event(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri("/")
        .header("ce-specversion", "1.0")
        .header("ce-id", "9876")
        .header("ce-source", "//pubsub.googleapis.com/projects/p/topics/logs")
        .header("ce-type", "google.cloud.pubsub.topic.v1.messagePublished")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn archives_raw_log_entry() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26.535897932Z");

    let (status, body) = send(app, binary_event(push_body(entry.as_bytes()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
    assert_eq!(
        sink.objects(),
        vec![(
            String::from("t1/j1/1741964966535897932.json"),
            Bytes::from(entry)
        )]
    );
}

#[tokio::test]
async fn archives_structured_mode_event() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26Z");
    let push: Value = serde_json::from_str(&push_body(entry.as_bytes())).unwrap();
    let event = json!({
        "specversion": "1.0",
        "id": "9876",
        "source": "//pubsub.googleapis.com/projects/p/topics/logs",
        "type": "google.cloud.pubsub.topic.v1.messagePublished",
        "datacontenttype": "application/json",
        "data": push
    });

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/")
        .header(http::header::CONTENT_TYPE, "application/cloudevents+json")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        sink.objects(),
        vec![(
            String::from("t1/j1/1741964966000000000.json"),
            Bytes::from(entry)
        )]
    );
}

#[tokio::test]
async fn accepts_any_method_on_root() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26Z");

    let mut request = binary_event(push_body(entry.as_bytes()));
    *request.method_mut() = http::Method::PUT;
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sink.objects().len(), 1);
}

#[tokio::test]
async fn rejects_request_without_envelope() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26Z");

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(push_body(entry.as_bytes())))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("expected CloudEvent"));
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn rejects_invalid_notification() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);

    let (status, body) = send(app, binary_event(r#"{"subscription": "s"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("expected PubSubMessage"));
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn rejects_invalid_log_entry() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);

    let (status, body) = send(app, binary_event(push_body(b"plain text line"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("expected LogEntry"));
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn rejects_log_entry_given_as_array() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let entry = json!([{"tenant_id": "t1", "job_id": "j1"}, "2025-03-14T15:09:26Z"]).to_string();

    let (status, body) = send(app, binary_event(push_body(entry.as_bytes()))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("expected LogEntry"));
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn rejects_empty_message_data() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), MAX_BODY_SIZE, None);
    let body = json!({"message": {"messageId": "1"}, "subscription": "s"}).to_string();

    let (status, _) = send(app, binary_event(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn rejects_unaddressable_identifiers() {
    for (tenant_id, job_id) in [("", "j1"), ("t1", ""), ("..", "j1"), ("t1", "a/b")] {
        let sink = MemorySink::default();
        let app = router(sink.clone(), MAX_BODY_SIZE, None);
        let entry = log_entry(tenant_id, job_id, "2025-03-14T15:09:26Z");

        let (status, _) = send(app, binary_event(push_body(entry.as_bytes()))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{tenant_id:?}/{job_id:?}");
        assert!(sink.objects().is_empty());
    }
}

#[tokio::test]
async fn storage_failures_are_server_errors() {
    for failure in [Failure::Write, Failure::Close] {
        let app = router(FailingSink { failure }, MAX_BODY_SIZE, None);
        let entry = log_entry("t1", "j1", "2025-03-14T15:09:26Z");

        let (status, body) = send(app, binary_event(push_body(entry.as_bytes()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(&body[..], b"ok");
    }
}

#[tokio::test]
async fn redelivery_is_not_deduplicated() {
    let sink = MemorySink::default();
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26.000000001Z");
    let redelivered = log_entry("t1", "j1", "2025-03-14T15:09:26.000000002Z");

    for entry in [&entry, &redelivered] {
        let app = router(sink.clone(), MAX_BODY_SIZE, None);
        let (status, _) = send(app, binary_event(push_body(entry.as_bytes()))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let keys: Vec<String> = sink.objects().into_iter().map(|(key, _)| key).collect();
    assert_eq!(
        keys,
        vec![
            "t1/j1/1741964966000000001.json",
            "t1/j1/1741964966000000002.json"
        ]
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let sink = MemorySink::default();
    let app = router(sink.clone(), 64, None);
    let entry = log_entry("t1", "j1", "2025-03-14T15:09:26Z");

    let (status, _) = send(app, binary_event(push_body(entry.as_bytes()))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(sink.objects().is_empty());
}

#[tokio::test]
async fn writes_through_object_store() {
    let store = Arc::new(InMemory::new());
    let app = router(
        ObjectStoreSink::new(store.clone(), String::from("log-archive")),
        MAX_BODY_SIZE,
        None,
    );
    let entry = log_entry("acme", "nightly-export", "2025-03-14T15:09:26.5Z");

    let (status, _) = send(app, binary_event(push_body(entry.as_bytes()))).await;
    assert_eq!(status, StatusCode::OK);

    let stored = store
        .get(&Path::from("acme/nightly-export/1741964966500000000.json"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(stored, Bytes::from(entry));
}

#[tokio::test]
async fn health_routes_respond() {
    for path in ["/_readiness", "/_liveness"] {
        let app = router(MemorySink::default(), MAX_BODY_SIZE, None);
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
    }
}
