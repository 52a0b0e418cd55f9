//! Custom Axum Extractors
//!
//! Request extractors for the caller identity, device binding, path ids,
//! list queries and validated bodies. Every rejection renders as the
//! standard envelope.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use stockroom_auth::AuthenticatedUser;
use uuid::Uuid;

use crate::dto::ListQuery;
use crate::error::ApiError;

/// Header binding a refresh session to a client device
pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

// =============================================================================
// Authenticated User Extractor
// =============================================================================

/// Caller identity placed in the request by the auth gate
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized.into_response())
    }
}

// =============================================================================
// Device ID Extractor
// =============================================================================

/// Value of the required `X-Device-ID` header
#[derive(Debug, Clone)]
pub struct DeviceId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for DeviceId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| DeviceId(v.to_string()))
            .ok_or_else(|| {
                ApiError::missing_header(DEVICE_ID_HEADER, "Device ID required").into_response()
            })
    }
}

// =============================================================================
// Resource ID Extractor
// =============================================================================

/// `:id` path segment parsed as a UUID
pub struct ResourceId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid ID format".to_string()).into_response())?;

        Uuid::parse_str(&raw)
            .map(ResourceId)
            .map_err(|_| ApiError::BadRequest("Invalid ID format".to_string()).into_response())
    }
}

// =============================================================================
// List Query Extractor
// =============================================================================

/// Page, search and sort parameters of a list request
pub struct Listing(pub ListQuery);

#[async_trait]
impl<S> FromRequestParts<S> for Listing
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()).into_response())?;

        Ok(Listing(query))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// JSON extractor with validation
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()).into_response())?;

        value
            .validate()
            .map_err(|e| ApiError::from(e).into_response())?;

        Ok(ValidatedJson(value))
    }
}

/// JSON body that may be absent entirely
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()).into_response())?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        serde_json::from_slice(&bytes)
            .map(|value| OptionalJson(Some(value)))
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_device_id_required() {
        let mut p = parts(axum::http::Request::builder().uri("/"));
        let rejection = DeviceId::from_request_parts(&mut p, &()).await.unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let mut p = parts(axum::http::Request::builder().uri("/").header(DEVICE_ID_HEADER, "  "));
        assert!(DeviceId::from_request_parts(&mut p, &()).await.is_err());

        let mut p = parts(axum::http::Request::builder().uri("/").header(DEVICE_ID_HEADER, "laptop-1"));
        let DeviceId(device) = DeviceId::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(device, "laptop-1");
    }

    #[tokio::test]
    async fn test_current_user_missing_is_unauthorized() {
        let mut p = parts(axum::http::Request::builder().uri("/"));
        let rejection = CurrentUser::from_request_parts(&mut p, &()).await.err().unwrap();
        assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_listing_parses_query() {
        let mut p = parts(axum::http::Request::builder().uri("/?page=2&limit=5&order=desc&search=bolt"));
        let Listing(query) = Listing::from_request_parts(&mut p, &()).await.ok().unwrap();
        let params = query.to_params();
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, 5);
        assert_eq!(params.search.as_deref(), Some("bolt"));

        let mut p = parts(axum::http::Request::builder().uri("/?order=sideways"));
        assert!(Listing::from_request_parts(&mut p, &()).await.is_err());
    }
}
