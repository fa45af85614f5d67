use lobbyforge_room::{RecorderError, StoreError};

/// Errors from the SQLite layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(err) => StoreError::Backend(err.to_string()),
            DbError::Serialization(err) => StoreError::Serialization(err),
        }
    }
}

impl From<DbError> for RecorderError {
    fn from(err: DbError) -> Self {
        RecorderError(err.to_string())
    }
}
