pub mod object_store;
pub mod pipeline;

pub use object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore, StoredBlob};
pub use pipeline::{DetectedType, ImagePipeline, MediaKind, StoredObject, Upload, UploadTarget};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Could not process image: {0}")]
    Decode(String),

    #[error("Object storage error: {0}")]
    Storage(String),
}
