use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    /// Map a unique-index violation to `ConstraintViolation` with the given message,
    /// passing every other error through unchanged.
    pub fn on_unique_violation(self, message: &str) -> Self {
        if self.is_unique_violation() {
            StorageError::ConstraintViolation(message.to_string())
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = StorageError::NotFound.on_unique_violation("Slug already exists");
        assert!(matches!(err, StorageError::NotFound));

        let err = StorageError::Database(sqlx::Error::PoolTimedOut)
            .on_unique_violation("Slug already exists");
        assert!(matches!(err, StorageError::Database(sqlx::Error::PoolTimedOut)));
    }
}
