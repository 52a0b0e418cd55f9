//! API error handling
//!
//! Every error renders as the standard [`Envelope`] with `status` set to
//! `error` for 4xx and `fail` for 5xx. Server-side details are logged, never
//! returned.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use stockroom_auth::AuthError;
use stockroom_db::DbError;
use thiserror::Error;

use crate::dto::{Envelope, FieldError};

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Validation failed")]
    Unprocessable(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // =========================================================================
    // Access Errors
    // =========================================================================
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Too many requests")]
    TooManyRequests { retry_after: u64 },

    // =========================================================================
    // Server Errors
    // =========================================================================
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Missing required request header
    pub fn missing_header(header: &str, message: &str) -> Self {
        Self::Unprocessable(vec![FieldError::new(header, message)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();

        let (errors, retry_after) = match self {
            Self::Validation(errors) | Self::Unprocessable(errors) => (errors, None),
            Self::TooManyRequests { retry_after } => (Vec::new(), Some(retry_after)),
            _ => (Vec::new(), None),
        };

        let mut response = Envelope::error(status, message, errors).into_response();

        // Add Retry-After header for rate limiting
        if let Some(retry_after) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

/// Renders requests rejected by the auth gate in the API envelope
pub fn auth_rejection(err: AuthError) -> Response {
    ApiError::from(err).into_response()
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_server_error() {
            tracing::error!(error = %err, "Authentication failed");
        }
        match err {
            AuthError::Validation(msg) => Self::BadRequest(msg),
            AuthError::DuplicateEmail => Self::Conflict("Email already registered".to_string()),
            AuthError::Forbidden => Self::Forbidden,
            AuthError::RateLimited { retry_after } => Self::TooManyRequests { retry_after },
            AuthError::StoreUnavailable(_) => Self::ServiceUnavailable,
            AuthError::SigningError(msg) | AuthError::Internal(msg) => Self::Internal(msg),
            // Every credential and token failure looks the same to a client
            _ => Self::Unauthorized,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => Self::NotFound("Resource".to_string()),
            DbError::Duplicate(constraint) => {
                tracing::debug!(constraint = %constraint, "Unique constraint violated");
                Self::Conflict("Resource already exists".to_string())
            }
            DbError::Constraint(constraint) => {
                tracing::debug!(constraint = %constraint, "Foreign key or check constraint violated");
                Self::BadRequest("Referenced resource does not exist".to_string())
            }
            DbError::InvalidInput(msg) => Self::BadRequest(msg),
            e if e.is_unavailable() => {
                tracing::error!(error = %e, "Database unavailable");
                Self::ServiceUnavailable
            }
            e => {
                tracing::error!(error = ?e, "Database error");
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<FieldError> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed on '{}' validation", e.code));
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("Product".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::TooManyRequests { retry_after: 10 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::missing_header("X-Device-ID", "Device ID required").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_auth_errors_collapse_to_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::TokenNotRegistered,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::TokenRevoked,
            AuthError::MissingToken,
            AuthError::UserNotFound,
        ] {
            assert!(matches!(ApiError::from(err), ApiError::Unauthorized));
        }
        assert!(matches!(
            ApiError::from(AuthError::StoreUnavailable("down".into())),
            ApiError::ServiceUnavailable
        ));
        assert!(matches!(ApiError::from(AuthError::DuplicateEmail), ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = ApiError::Internal("pool exhausted at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = auth_rejection(AuthError::RateLimited { retry_after: 7 });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["status_code"], 429);
    }
}
