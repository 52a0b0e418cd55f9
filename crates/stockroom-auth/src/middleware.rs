//! Authorization gate for Axum
//!
//! Tower middleware that, in order:
//! 1. requires `Authorization: Bearer <token>`
//! 2. verifies the token as an access token against the ledger
//! 3. counts the request against the token's rate limit
//! 4. builds the typed [`AuthenticatedUser`] and stores it in the request
//!    extensions
//!
//! and optionally applies the role policy before calling the handler.
//! Rejections never reach the inner service.

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::{AuthError, ErrorResponse};
use crate::jwt::TokenIssuer;
use crate::policy::authorize;
use crate::rate_limit::RateLimiter;
use crate::types::{AuthenticatedUser, TokenClass};

/// Renders a rejected request
pub type RejectFn = fn(AuthError) -> Response;

/// Authentication middleware layer
#[derive(Clone)]
pub struct AuthLayer {
    issuer: TokenIssuer,
    limiter: RateLimiter,
    enforce_policy: bool,
    reject: RejectFn,
}

impl AuthLayer {
    /// Create a new authentication layer
    pub fn new(issuer: TokenIssuer, limiter: RateLimiter) -> Self {
        Self {
            issuer,
            limiter,
            enforce_policy: false,
            reject: auth_error_response,
        }
    }

    /// Also apply the role policy to every request passing the gate
    pub fn with_policy(mut self) -> Self {
        self.enforce_policy = true;
        self
    }

    /// Replace the default JSON error body
    pub fn with_rejection(mut self, reject: RejectFn) -> Self {
        self.reject = reject;
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    layer: AuthLayer,
}

impl<S> Service<Request> for AuthMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let layer = self.layer.clone();
        // Swap in a fresh clone so the instance that was polled ready is
        // the one that handles this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let user = match authenticate(req.headers(), &layer.issuer, &layer.limiter).await {
                Ok(user) => user,
                Err(e) => return Ok((layer.reject)(e)),
            };

            if layer.enforce_policy {
                let path = req
                    .extensions()
                    .get::<OriginalUri>()
                    .map(|uri| uri.0.path().to_string())
                    .unwrap_or_else(|| req.uri().path().to_string());

                if let Err(e) = authorize(req.method(), &path, user.role) {
                    tracing::info!(
                        user_id = %user.user_id,
                        role = %user.role,
                        method = %req.method(),
                        path = %path,
                        "Request denied by role policy"
                    );
                    return Ok((layer.reject)(e));
                }
            }

            let (mut parts, body) = req.into_parts();
            parts.extensions.insert(user);
            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

/// Run the gate steps against a request's headers
pub async fn authenticate(
    headers: &HeaderMap,
    issuer: &TokenIssuer,
    limiter: &RateLimiter,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;

    let claims = match issuer.verify(token, TokenClass::Access).await {
        Ok(claims) => claims,
        Err(e) if e.is_server_error() => {
            tracing::error!(error = %e, "Token verification failed");
            return Err(AuthError::InvalidToken);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return Err(e);
        }
    };

    limiter.check(token).await?;

    AuthenticatedUser::from_claims(claims, token.to_string())
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Default error response for rejected requests
pub fn auth_error_response(error: AuthError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::from(&error);

    let mut res = Response::new(Body::from(serde_json::to_vec(&body).unwrap_or_default()));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    // Add Retry-After header for rate limiting
    if let Some(retry_after) = body.retry_after {
        res.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    }

    res
}
