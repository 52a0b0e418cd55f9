//! Authentication error types
//!
//! Errors are designed to be:
//! - Informative for logging/debugging
//! - Safe for external exposure (every 401 looks the same to a client)
//! - Convertible to HTTP status codes

use serde::{Deserialize, Serialize};
use stockroom_db::DbError;
use thiserror::Error;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Message returned for every 401, whatever the underlying cause.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Request data failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email already registered
    #[error("Email already registered")]
    DuplicateEmail,

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// Unknown email, wrong password or unusable account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Subject of a valid token no longer exists
    #[error("User not found")]
    UserNotFound,

    // =========================================================================
    // Token Errors
    // =========================================================================
    /// Token is not present in the issued-token ledger
    #[error("Token not registered")]
    TokenNotRegistered,

    /// Signature or algorithm check failed
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token or session has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Refresh session has been revoked, or rotation lost a race
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Token is malformed, of the wrong class, or bound to another user
    #[error("Invalid token")]
    InvalidToken,

    /// No bearer token on the request
    #[error("Missing bearer token")]
    MissingToken,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    /// Role is not allowed to perform the request
    #[error("Forbidden")]
    Forbidden,

    /// Rate limit exceeded
    #[error("Rate limit exceeded, try again in {retry_after} seconds")]
    RateLimited {
        /// Seconds until the window resets
        retry_after: u64,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Token could not be signed or registered
    #[error("Token signing failed: {0}")]
    SigningError(String),

    /// Backing store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error (should not be exposed to clients)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::Validation(_) => 400,

            // 401 Unauthorized
            Self::InvalidCredentials
            | Self::UserNotFound
            | Self::TokenNotRegistered
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::InvalidToken
            | Self::MissingToken => 401,

            // 403 Forbidden
            Self::Forbidden => 403,

            // 409 Conflict
            Self::DuplicateEmail => 409,

            // 429 Too Many Requests
            Self::RateLimited { .. } => 429,

            // 503 Service Unavailable
            Self::StoreUnavailable(_) => 503,

            // 500 Internal Server Error
            Self::SigningError(_) | Self::Internal(_) => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::StoreUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::SigningError(_) | Self::Internal(_) => "INTERNAL_ERROR",
            _ => "UNAUTHORIZED",
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self.status_code() {
            401 => UNAUTHORIZED_MESSAGE.to_string(),
            503 => "Service temporarily unavailable".to_string(),
            500 => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    /// Retry hint in seconds, set only for rate limiting
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Create a rate limit error with retry-after duration
    pub fn rate_limited(duration: std::time::Duration) -> Self {
        Self::RateLimited {
            retry_after: duration.as_secs().max(1),
        }
    }
}

/// Error body for responses produced inside the auth layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub code: String,
    /// Error message (human-readable)
    pub message: String,
    /// Retry-after in seconds (for rate limiting)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<&AuthError> for ErrorResponse {
    fn from(error: &AuthError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.client_message(),
            retry_after: error.retry_after(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::InvalidSignature
            }
            _ => Self::InvalidToken,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(_) => Self::DuplicateEmail,
            DbError::NotFound(_) => Self::UserNotFound,
            DbError::InvalidInput(msg) => Self::Validation(msg),
            e if e.is_unavailable() => Self::StoreUnavailable(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Validation("x".into()).status_code(), 400);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::TokenNotRegistered.status_code(), 401);
        assert_eq!(AuthError::Forbidden.status_code(), 403);
        assert_eq!(AuthError::DuplicateEmail.status_code(), 409);
        assert_eq!(AuthError::RateLimited { retry_after: 10 }.status_code(), 429);
        assert_eq!(AuthError::StoreUnavailable("redis".into()).status_code(), 503);
        assert_eq!(AuthError::SigningError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_all_unauthorized_look_alike() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::TokenNotRegistered,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::TokenRevoked,
            AuthError::InvalidToken,
            AuthError::MissingToken,
        ];
        for err in errors {
            assert_eq!(err.client_message(), UNAUTHORIZED_MESSAGE);
            assert_eq!(err.error_code(), "UNAUTHORIZED");
        }
    }

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = AuthError::StoreUnavailable("redis://:hunter2@cache".to_string());
        assert!(!err.client_message().contains("hunter2"));
        let err = AuthError::Internal("stack".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
    }

    #[test]
    fn test_db_error_mapping() {
        assert!(matches!(
            AuthError::from(DbError::Duplicate("users_email_key".into())),
            AuthError::DuplicateEmail
        ));
        assert!(matches!(
            AuthError::from(DbError::Redis("down".into())),
            AuthError::StoreUnavailable(_)
        ));
        assert!(matches!(
            AuthError::from(DbError::Constraint("fk".into())),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn test_error_response() {
        let err = AuthError::rate_limited(std::time::Duration::from_secs(7));
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "RATE_LIMIT_EXCEEDED");
        assert_eq!(response.retry_after, Some(7));
    }
}
