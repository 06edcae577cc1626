use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::api::IngestError;
use crate::key::ObjectKey;
use crate::sinks::ObjectSink;

/// Logs objects instead of storing them, for local development.
pub struct PrintSink {}

#[async_trait]
impl ObjectSink for PrintSink {
    async fn write(&self, key: &ObjectKey, data: Bytes) -> Result<(), IngestError> {
        info!(key = %key, size = data.len(), "object: {}", String::from_utf8_lossy(&data));
        Ok(())
    }
}
