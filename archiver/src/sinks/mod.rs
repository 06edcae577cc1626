use async_trait::async_trait;
use bytes::Bytes;

use crate::api::IngestError;
use crate::key::ObjectKey;

pub mod print;
pub mod store;

/// Durable destination for archived payloads.
///
/// `write` returns only once the object is committed: an `Ok` means the
/// full payload is readable under `key`, an `Err` means nothing was committed.
#[async_trait]
pub trait ObjectSink {
    async fn write(&self, key: &ObjectKey, data: Bytes) -> Result<(), IngestError>;
}
