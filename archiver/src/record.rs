use serde::Deserialize;
use time::OffsetDateTime;

use crate::api::IngestError;
use crate::json::{from_object_slice, optional_object};

/// The subset of a Cloud Logging entry needed to name the stored object.
///
/// Decoding is lenient: absent identifiers read as empty strings and an absent
/// receive timestamp reads as the Unix epoch. Whether the resulting key can be
/// stored is decided later, by `ObjectKey::check_addressable`.
#[derive(Debug, Default, Deserialize)]
pub struct LogRecord {
    #[serde(
        default,
        rename = "jsonPayload",
        alias = "payload",
        deserialize_with = "optional_object"
    )]
    payload: Option<RecordPayload>,
    #[serde(
        default,
        rename = "receiveTimestamp",
        with = "time::serde::rfc3339::option"
    )]
    receive_timestamp: Option<OffsetDateTime>,
}

// tenant_id and job_id are custom fields added through structured logging
#[derive(Debug, Default, Deserialize)]
struct RecordPayload {
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
}

impl LogRecord {
    pub fn from_slice(data: &[u8]) -> Result<LogRecord, IngestError> {
        from_object_slice(data).map_err(|e| IngestError::MalformedRecord(e.to_string()))
    }

    pub fn tenant_id(&self) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| p.tenant_id.as_deref())
            .unwrap_or_default()
    }

    pub fn job_id(&self) -> &str {
        self.payload
            .as_ref()
            .and_then(|p| p.job_id.as_deref())
            .unwrap_or_default()
    }

    pub fn receive_timestamp(&self) -> OffsetDateTime {
        self.receive_timestamp.unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
