pub mod batch;
pub mod document;
pub mod embedder;
pub mod sync;
pub mod vector_index;

pub use batch::{BatchSync, SyncReport};
pub use document::{compose_document, strip_markup, truncate_chars, LookupSnapshot, ResolvedNames};
pub use embedder::{Embedder, Embedding, OpenAiEmbedder};
pub use sync::{vector_id, EmbeddingSync, SyncOutcome};
pub use vector_index::{HttpVectorIndex, MemoryVectorIndex, VectorIndex, VectorRecord};

use thiserror::Error;

use crate::database::StoreError;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model error: {0}")]
    Model(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Member {0} not found")]
    MemberNotFound(String),
}
