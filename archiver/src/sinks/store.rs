use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::ObjectStore;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};

use crate::api::IngestError;
use crate::key::ObjectKey;
use crate::sinks::ObjectSink;

/// Writes each payload as its own object in a single bucket.
///
/// The store handle is shared by all requests; the bucket is fixed at construction.
#[derive(Clone)]
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreSink {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String) -> ObjectStoreSink {
        ObjectStoreSink { store, bucket }
    }

    /// Google Cloud Storage, authenticated from the environment
    /// (service account variables or application default credentials).
    pub fn gcs(bucket: String) -> anyhow::Result<ObjectStoreSink> {
        info!("connecting to GCS bucket {}...", bucket);
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(&bucket)
            .build()?;

        Ok(ObjectStoreSink::new(Arc::new(store), bucket))
    }
}

#[async_trait]
impl ObjectSink for ObjectStoreSink {
    #[instrument(skip_all, fields(key = %key, size = data.len()))]
    async fn write(&self, key: &ObjectKey, data: Bytes) -> Result<(), IngestError> {
        // ingest rejects such keys through ObjectKey::check_addressable before writing
        let location = Path::parse(key.to_string()).map_err(|e| {
            error!("invalid object path gs://{}/{}: {}", self.bucket, key, e);
            IngestError::StorageWriteError
        })?;
        let mut writer = BufWriter::new(self.store.clone(), location);

        // Dropping the writer before shutdown abandons the upload, nothing gets committed.
        if let Err(e) = writer.write_all(&data).await {
            error!("failed to write gs://{}/{}: {}", self.bucket, key, e);
            return Err(IngestError::StorageWriteError);
        }

        if let Err(e) = writer.shutdown().await {
            error!("failed to finalize gs://{}/{}: {}", self.bucket, key, e);
            return Err(IngestError::StorageCloseError);
        }

        debug!("wrote gs://{}/{}", self.bucket, key);
        Ok(())
    }
}
