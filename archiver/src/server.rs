use std::future::Future;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::prometheus::setup_metrics_recorder;
use crate::router;
use crate::sinks::print::PrintSink;
use crate::sinks::store::ObjectStoreSink;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = if config.export_prometheus {
        Some(setup_metrics_recorder()?)
    } else {
        None
    };

    let app = if config.print_sink {
        router::router(PrintSink {}, config.max_body_size, metrics)
    } else {
        let sink = ObjectStoreSink::gcs(config.target_bucket)?;
        router::router(sink, config.max_body_size, metrics)
    };

    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
