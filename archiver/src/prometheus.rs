// prometheus exporter setup

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub const ARCHIVER_REQUESTS_REJECTED_TOTAL: &str = "archiver_requests_rejected_total";
pub const ARCHIVER_STORAGE_ERRORS_TOTAL: &str = "archiver_storage_errors_total";
pub const ARCHIVER_OBJECTS_WRITTEN_TOTAL: &str = "archiver_objects_written_total";
pub const ARCHIVER_OBJECT_SIZE_BYTES: &str = "archiver_object_size_bytes";

pub fn report_rejected_request(cause: &'static str) {
    counter!(ARCHIVER_REQUESTS_REJECTED_TOTAL, "cause" => cause).increment(1);
}

pub fn report_storage_error(cause: &'static str) {
    counter!(ARCHIVER_STORAGE_ERRORS_TOTAL, "cause" => cause).increment(1);
}

pub fn report_object_written(size: usize) {
    counter!(ARCHIVER_OBJECTS_WRITTEN_TOTAL).increment(1);
    histogram!(ARCHIVER_OBJECT_SIZE_BYTES).record(size as f64);
}

pub fn setup_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];
    const PAYLOAD_SIZES: &[f64] = &[
        1024.0,     // 1KB
        10240.0,    // 10KB
        102400.0,   // 100KB
        1048576.0,  // 1MB
        10485760.0, // 10MB, the Pub/Sub message size limit
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(ARCHIVER_OBJECT_SIZE_BYTES.to_string()),
            PAYLOAD_SIZES,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Middleware to record some common HTTP metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    // Run the rest of the request handling first, so we can measure it and get response
    // codes.
    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
