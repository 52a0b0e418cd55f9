//! Authentication Handlers
//!
//! Signup, signin, token refresh, password and role changes, signout. The
//! handlers only translate between HTTP and [`stockroom_auth::AuthEngine`].

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use stockroom_auth::{Role, SignupInput};

use crate::dto::{
    ChangePasswordRequest, ChangeRoleRequest, Envelope, RefreshTokenRequest, SigninRequest,
    SignoutRequest, SignupRequest, SignupResponse, TokenPairResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, DeviceId, OptionalJson, ValidatedJson, DEVICE_ID_HEADER};
use crate::state::AppState;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> ApiResult<Envelope<SignupResponse>> {
    let user = state
        .auth
        .engine
        .signup(SignupInput {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
        })
        .await?;

    Ok(Envelope::success(
        StatusCode::CREATED,
        "User created successfully",
        SignupResponse {
            id: user.id,
            email: user.email,
        },
    ))
}

/// Sign in and open a session for the calling device
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Authentication",
    request_body = SigninRequest,
    params(("X-Device-ID" = String, Header, description = "Client device identifier")),
    responses(
        (status = 200, description = "Login successful", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Missing X-Device-ID header")
    )
)]
pub async fn signin(
    State(state): State<Arc<AppState>>,
    DeviceId(device_id): DeviceId,
    ValidatedJson(request): ValidatedJson<SigninRequest>,
) -> ApiResult<Envelope<TokenPairResponse>> {
    let pair = state
        .auth
        .engine
        .signin(&request.email, &request.password, &device_id)
        .await?;

    Ok(Envelope::success(StatusCode::OK, "Login successful", pair.into()))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    tag = "Authentication",
    request_body = RefreshTokenRequest,
    params(("X-Device-ID" = String, Header, description = "Client device identifier")),
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenPairResponse),
        (status = 401, description = "Unknown, revoked or expired refresh token"),
        (status = 422, description = "Missing X-Device-ID header")
    )
)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    DeviceId(device_id): DeviceId,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Envelope<TokenPairResponse>> {
    let pair = state
        .auth
        .engine
        .refresh(&request.refresh_token, &device_id)
        .await?;

    Ok(Envelope::success(StatusCode::OK, "Token refreshed successfully", pair.into()))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Authentication",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Old password does not match")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Envelope<()>> {
    state
        .auth
        .engine
        .change_password(user.user_id, &request.old_password, &request.new_password)
        .await?;

    Ok(Envelope::success(StatusCode::OK, "Password changed successfully", ()))
}

/// Change the caller's role
#[utoipa::path(
    post,
    path = "/api/auth/change-role",
    tag = "Authentication",
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed successfully"),
        (status = 400, description = "Unknown role")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<ChangeRoleRequest>,
) -> ApiResult<Envelope<()>> {
    let role: Role = request.role.parse()?;

    state.auth.engine.change_role(user.user_id, role).await?;

    Ok(Envelope::success(StatusCode::OK, "Role changed successfully", ()))
}

/// Revoke a refresh session
///
/// Revokes the session holding the refresh token in the body, or when no
/// token is sent, the caller's session on the `X-Device-ID` device.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "Authentication",
    request_body(content = SignoutRequest, description = "Optional; X-Device-ID is required when absent"),
    params(("X-Device-ID" = Option<String>, Header, description = "Device to sign out when no refresh token is sent")),
    responses(
        (status = 200, description = "Signout successful"),
        (status = 422, description = "Neither refresh token nor X-Device-ID header")
    ),
    security(("bearer_auth" = []))
)]
pub async fn signout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    device: Option<DeviceId>,
    OptionalJson(request): OptionalJson<SignoutRequest>,
) -> ApiResult<Envelope<()>> {
    let refresh_token = request
        .and_then(|r| r.refresh_token)
        .filter(|t| !t.is_empty());

    match (refresh_token, device) {
        (Some(token), _) => state.auth.engine.signout(&token).await?,
        (None, Some(DeviceId(device_id))) => {
            state.auth.engine.signout_device(user.user_id, &device_id).await?
        }
        (None, None) => {
            return Err(ApiError::missing_header(
                DEVICE_ID_HEADER,
                "Device ID required when no refresh token is sent",
            ))
        }
    }

    tracing::debug!(user_id = %user.user_id, "Signout requested");
    Ok(Envelope::success(StatusCode::OK, "Signout successful", ()))
}
