use std::fmt;

use time::OffsetDateTime;

use crate::api::IngestError;

/// Builds `<tenant_id>/<job_id>/<unix nanos>.json`. Segments are used as-is.
pub fn derive_object_key(tenant_id: &str, job_id: &str, timestamp: OffsetDateTime) -> String {
    format!(
        "{}/{}/{}.json",
        tenant_id,
        job_id,
        timestamp.unix_timestamp_nanos()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    tenant_id: String,
    job_id: String,
    timestamp: OffsetDateTime,
}

impl ObjectKey {
    pub fn derive(tenant_id: &str, job_id: &str, timestamp: OffsetDateTime) -> ObjectKey {
        ObjectKey {
            tenant_id: tenant_id.to_owned(),
            job_id: job_id.to_owned(),
            timestamp,
        }
    }

    /// Rejects identifiers that would leave the `<tenant>/<job>/` layout or
    /// cannot be stored as a single path segment.
    pub fn check_addressable(&self) -> Result<(), IngestError> {
        for (name, segment) in [("tenant_id", &self.tenant_id), ("job_id", &self.job_id)] {
            if segment.is_empty() {
                return Err(IngestError::UnaddressableKey(format!("empty {name}")));
            }
            if segment == "." || segment == ".." {
                return Err(IngestError::UnaddressableKey(format!(
                    "{name} is a relative path segment"
                )));
            }
            if segment.contains('/') || segment.chars().any(|c| c.is_ascii_control()) {
                return Err(IngestError::UnaddressableKey(format!(
                    "{name} contains a path separator or control character"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&derive_object_key(
            &self.tenant_id,
            &self.job_id,
            self.timestamp,
        ))
    }
}
