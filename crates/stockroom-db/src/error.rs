//! Database error types

use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DbError {
    /// Classify a sqlx error, turning unique and foreign-key violations into
    /// `Duplicate` / `Constraint` so callers can react without parsing text.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return DbError::Duplicate(constraint);
            }
            if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                return DbError::Constraint(constraint);
            }
        }
        DbError::Query(err)
    }

    /// True for failures of the backing stores themselves (as opposed to
    /// data-level outcomes like a missing row or a duplicate key).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::Connection(_) | DbError::Query(_) | DbError::Redis(_) | DbError::Transaction(_)
        )
    }
}

impl From<deadpool_redis::PoolError> for DbError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        DbError::Redis(e.to_string())
    }
}

impl From<redis::RedisError> for DbError {
    fn from(e: redis::RedisError) -> Self {
        DbError::Redis(e.to_string())
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
