use sea_orm::DbErr;
use thiserror::Error;

use crate::primary_key::KeyFormatError;

/// Errors raised by [`crate::Service`] operations.
///
/// `Unsupported` is the base kind; `CommitFailed`, `NotFound` and
/// `MultipleResultsFound` are the specific service failures. `InvalidKey` and
/// `Db` pass through problems that did not originate in the service itself.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unsupported(String),
    #[error("{message}")]
    CommitFailed {
        message: String,
        #[source]
        source: DbErr,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("multiple results found: {0}")]
    MultipleResultsFound(String),
    #[error(transparent)]
    InvalidKey(#[from] KeyFormatError),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl ServiceError {
    pub fn commit_failed(message: impl Into<String>, source: DbErr) -> Self {
        Self::CommitFailed { message: message.into(), source }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Unsupported(_) => 2000,
            ServiceError::CommitFailed { .. } => 2001,
            ServiceError::NotFound(_) => 2002,
            ServiceError::MultipleResultsFound(_) => 2003,
            ServiceError::InvalidKey(_) => 2100,
            ServiceError::Db(_) => 2200,
        }
    }
}
