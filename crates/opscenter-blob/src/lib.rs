//! Backing store for uploaded document bytes.
//!
//! [`BlobStore`] wraps an [`ObjectStore`] together with the naming scheme
//! its storage URIs follow:
//!
//! - local volume: file `<uploads_dir>/<request_id><ext>`, URI `uploads/<request_id><ext>`
//! - bucket: object `docs/<request_id>/<filename>`, URI `gs://<bucket>/docs/<request_id>/<filename>`
//!
//! The returned URI is what gets persisted as `doc_asset.storage_uri`.

pub mod error;

pub use error::BlobError;

use bytes::Bytes;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use opscenter_core::{StorageBackend, StorageConfig};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// Flat `<request_id><ext>` files, URIs relative to `uploads/`.
    Volume,
    /// `docs/<request_id>/<filename>` objects in a named bucket.
    Bucket(String),
}

/// Uploaded-bytes store.
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
    layout: Layout,
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("store", &self.store.to_string())
            .field("layout", &self.layout)
            .finish()
    }
}

impl BlobStore {
    /// Build the upload store selected by configuration.
    pub fn from_config(cfg: &StorageConfig) -> Result<Self, BlobError> {
        match cfg.backend {
            StorageBackend::Local => Self::local(&cfg.uploads_dir),
            StorageBackend::Gcs => {
                let bucket = cfg
                    .gcs_bucket
                    .as_deref()
                    .ok_or(BlobError::BucketNotConfigured)?;
                Self::gcs(bucket)
            }
        }
    }

    /// Local directory store. The directory is created if missing.
    pub fn local(dir: &Path) -> Result<Self, BlobError> {
        std::fs::create_dir_all(dir).map_err(|source| BlobError::UploadsDir {
            path: dir.display().to_string(),
            source,
        })?;
        let store = LocalFileSystem::new_with_prefix(dir)?;
        tracing::info!(dir = %dir.display(), "Using local uploads directory");
        Ok(Self {
            store: Arc::new(store),
            layout: Layout::Volume,
        })
    }

    /// GCS bucket store. Credentials come from the environment
    /// (`GOOGLE_APPLICATION_CREDENTIALS` or the metadata server).
    pub fn gcs(bucket: &str) -> Result<Self, BlobError> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()?;
        tracing::info!(bucket, "Using GCS bucket");
        Ok(Self {
            store: Arc::new(store),
            layout: Layout::Bucket(bucket.to_string()),
        })
    }

    /// In-memory store with the local-volume naming scheme.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            layout: Layout::Volume,
        }
    }

    /// In-memory store with the bucket naming scheme.
    pub fn in_memory_bucket(bucket: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            layout: Layout::Bucket(bucket.to_string()),
        }
    }

    /// Bucket name, when this store is bucket-backed.
    pub fn bucket(&self) -> Option<&str> {
        match &self.layout {
            Layout::Bucket(b) => Some(b),
            Layout::Volume => None,
        }
    }

    /// Persist an upload and return its storage URI.
    pub async fn save_upload(
        &self,
        request_id: &str,
        filename: &str,
        content_type: Option<&str>,
        content: Bytes,
    ) -> Result<String, BlobError> {
        let size = content.len();
        let uri = match &self.layout {
            Layout::Volume => {
                let name = format!("{request_id}{}", extension_of(filename));
                let location = ObjectPath::from_iter([name.as_str()]);
                self.store.put(&location, PutPayload::from(content)).await?;
                format!("uploads/{location}")
            }
            Layout::Bucket(bucket) => {
                let location =
                    ObjectPath::parse(format!("docs/{request_id}/{}", object_name(filename)))?;
                let mut attributes = Attributes::new();
                attributes.insert(
                    Attribute::ContentType,
                    content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string().into(),
                );
                self.store
                    .put_opts(&location, PutPayload::from(content), PutOptions::from(attributes))
                    .await?;
                format!("gs://{bucket}/{location}")
            }
        };

        tracing::info!(request_id, filename, %uri, size, "Saved upload");
        Ok(uri)
    }

    /// Write, verify and remove a small text object under `smoke/`.
    ///
    /// Returns the object name that was exercised.
    pub async fn smoke_check(&self, request_id: &str) -> Result<String, BlobError> {
        let location = ObjectPath::from_iter(["smoke", &format!("{}.txt", uuid::Uuid::new_v4())]);
        let body = format!("GCS smoke test - request_id: {request_id}\n");

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, "text/plain".into());
        self.store
            .put_opts(&location, PutPayload::from(body), PutOptions::from(attributes))
            .await?;

        let meta = self.store.head(&location).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                BlobError::Verification(format!("{location} does not exist after upload"))
            }
            other => BlobError::Store(other),
        })?;
        tracing::info!(request_id, object = %location, size = meta.size, "Verified smoke object");

        self.store.delete(&location).await?;
        Ok(location.to_string())
    }
}

/// Filename as a single literal object segment.
///
/// Separators and control characters become `_`; `.`, `..` and empty names
/// become `unnamed`. Everything else is kept verbatim.
fn object_name(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => name,
    }
}

/// Extension with its leading dot, or empty.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}
