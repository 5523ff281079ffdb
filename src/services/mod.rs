pub mod member_service;
pub mod sanitize;

pub use member_service::{MemberService, SessionCount};
pub use sanitize::{sanitize_create, sanitize_update};

use crate::database::StoreError;
use crate::media::MediaError;

/// Tagged failure of a service operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    MemberNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Storage failure: {}", err);
        ServiceError::Internal(err.to_string())
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedType(_) | MediaError::TooLarge { .. } | MediaError::Decode(_) => {
                ServiceError::Validation(err.to_string())
            }
            MediaError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            MediaError::Storage(_) => {
                tracing::error!("Object storage failure: {}", err);
                ServiceError::Internal(err.to_string())
            }
        }
    }
}
