use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned once an object has been durably written.
pub const ACK_BODY: &str = "ok";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("expected CloudEvent: {0}")]
    MalformedEnvelope(String),
    #[error("expected PubSubMessage: {0}")]
    MalformedNotification(String),
    #[error("expected LogEntry: {0}")]
    MalformedRecord(String),
    #[error("invalid object key: {0}")]
    UnaddressableKey(String),

    #[error("failed to write object")]
    StorageWriteError,
    #[error("failed to finalize object")]
    StorageCloseError,
}

impl IngestError {
    /// Label used for the rejection and storage error counters.
    pub fn cause(&self) -> &'static str {
        match self {
            IngestError::MalformedEnvelope(_) => "malformed_envelope",
            IngestError::MalformedNotification(_) => "malformed_notification",
            IngestError::MalformedRecord(_) => "malformed_record",
            IngestError::UnaddressableKey(_) => "unaddressable_key",
            IngestError::StorageWriteError => "storage_write",
            IngestError::StorageCloseError => "storage_close",
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            IngestError::StorageWriteError | IngestError::StorageCloseError
        )
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        match self {
            IngestError::MalformedEnvelope(_)
            | IngestError::MalformedNotification(_)
            | IngestError::MalformedRecord(_)
            | IngestError::UnaddressableKey(_) => {
                (StatusCode::BAD_REQUEST, format!("Bad Request: {self}"))
            }

            IngestError::StorageWriteError | IngestError::StorageCloseError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Internal Server Error"),
            ),
        }
        .into_response()
    }
}
