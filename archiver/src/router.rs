use std::future::ready;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::prometheus::track_metrics;
use crate::{ingest, sinks};

#[derive(Clone)]
pub struct State {
    pub sink: Arc<dyn sinks::ObjectSink + Send + Sync>,
}

async fn index() -> &'static str {
    "archiver"
}

pub fn router<S: sinks::ObjectSink + Send + Sync + 'static>(
    sink: S,
    max_body_size: usize,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let state = State {
        sink: Arc::new(sink),
    };

    let router = Router::new()
        .route("/", any(ingest::event))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when archiver is used as a library (during tests etc)
    // does not work well.
    match metrics {
        Some(recorder_handle) => {
            router.route("/metrics", get(move || ready(recorder_handle.render())))
        }
        None => router,
    }
}
