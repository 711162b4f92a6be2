//! Storage-specific error type wrapping sqlx errors.

use herald_domain::error::HeraldError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize a JSON column.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HeraldError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_box_storage_error_into_herald_error() {
        let err: HeraldError = StorageError::Database(sqlx::Error::RowNotFound).into();
        let HeraldError::Storage(source) = err else {
            panic!("expected a storage error");
        };
        assert_eq!(source.to_string(), "database error");
    }
}
