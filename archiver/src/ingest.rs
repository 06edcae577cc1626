use axum::extract::State;
use axum::http::HeaderMap;
use bytes::Bytes;
use tracing::field::display;
use tracing::{debug, error, instrument, warn, Span};

use crate::api::{IngestError, ACK_BODY};
use crate::envelope::Envelope;
use crate::key::ObjectKey;
use crate::notification::Notification;
use crate::prometheus::{report_object_written, report_rejected_request, report_storage_error};
use crate::record::LogRecord;
use crate::router;
use crate::sinks::ObjectSink;

/// Archives the log entry carried by one push delivery.
///
/// Responds `ok` once the object is committed. Invalid input is rejected with
/// a 400 before anything is written, storage failures answer 500 so that the
/// delivery platform redelivers.
#[instrument(
    skip_all,
    fields(
        event_id,
        delivery_id,
        subscription,
        publish_time,
        attributes,
        key,
        size = body.len()
    )
)]
pub async fn event(
    State(state): State<router::State>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, IngestError> {
    match process(state.sink.as_ref(), &headers, body).await {
        Ok(key) => {
            debug!("archived {}", key);
            Ok(ACK_BODY)
        }
        Err(err) if err.is_client_error() => {
            report_rejected_request(err.cause());
            warn!("rejected invalid payload: {}", err);
            Err(err)
        }
        Err(err) => {
            report_storage_error(err.cause());
            error!("failed to archive payload: {}", err);
            Err(err)
        }
    }
}

pub async fn process(
    sink: &(dyn ObjectSink + Send + Sync),
    headers: &HeaderMap,
    body: Bytes,
) -> Result<ObjectKey, IngestError> {
    let envelope = Envelope::from_http(headers, body)?;
    Span::current().record("event_id", envelope.id.as_str());

    let notification = Notification::from_envelope(&envelope)?;
    Span::current().record("delivery_id", notification.message.id.as_str());
    Span::current().record("subscription", notification.subscription.as_str());
    if let Some(publish_time) = notification.message.publish_time.as_deref() {
        Span::current().record("publish_time", publish_time);
    }
    if !notification.message.attributes.is_empty() {
        Span::current().record(
            "attributes",
            tracing::field::debug(&notification.message.attributes),
        );
    }

    let record = LogRecord::from_slice(&notification.message.data)?;

    let key = ObjectKey::derive(
        record.tenant_id(),
        record.job_id(),
        record.receive_timestamp(),
    );
    Span::current().record("key", display(&key));
    key.check_addressable()?;

    let data = notification.message.data;
    let size = data.len();
    sink.write(&key, data).await?;
    report_object_written(size);

    Ok(key)
}
