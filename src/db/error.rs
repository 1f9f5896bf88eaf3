//! Repository error type

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors returned by the repositories
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    DuplicateKey,

    #[error("referenced record does not exist")]
    ForeignKeyViolation,

    #[error("update failed: no matching record")]
    UpdateFailed,

    #[error("delete failed: no matching record")]
    DeleteFailed,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid stored value: {0}")]
    InvalidData(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl RepoError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        RepoError::InvalidParameter(message.into())
    }

    /// True for the variants that mean "the target row does not exist"
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            RepoError::NotFound | RepoError::UpdateFailed | RepoError::DeleteFailed
        )
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::RowNotFound => return RepoError::NotFound,
            sqlx::Error::Database(db_err) => Some(db_err.kind()),
            _ => None,
        };

        match kind {
            Some(ErrorKind::UniqueViolation) => RepoError::DuplicateKey,
            Some(ErrorKind::ForeignKeyViolation) => RepoError::ForeignKeyViolation,
            _ => RepoError::Database(err),
        }
    }
}
