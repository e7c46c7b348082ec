//! Error types for the blob crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    /// GCS was selected but no bucket name is configured.
    #[error("GCS_BUCKET_NAME not configured")]
    BucketNotConfigured,

    /// The local uploads directory could not be created.
    #[error("failed to prepare uploads directory {path}: {source}")]
    UploadsDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A freshly written object could not be read back.
    #[error("upload verification failed: {0}")]
    Verification(String),

    /// The upload's filename cannot form an object key.
    #[error("invalid object name: {0}")]
    ObjectName(#[from] object_store::path::Error),

    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),
}
