//! Health Check Handlers
//!
//! Endpoint for service health monitoring.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::dto::Envelope;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// PostgreSQL reachable
    pub postgres: bool,
    /// Redis reachable
    pub redis: bool,
    /// Service version
    pub version: String,
    /// Server time (unix millis)
    pub timestamp: i64,
}

/// Health check endpoint
///
/// Returns 200 when both backing stores answer, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A backing store is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Envelope<HealthResponse> {
    let health = state.stores.health_check().await;

    let (status, message) = if health.healthy {
        (StatusCode::OK, "Service is healthy")
    } else {
        tracing::warn!(postgres = health.postgres, redis = health.redis, "Health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "Service is unhealthy")
    };

    Envelope::success(
        status,
        message,
        HealthResponse {
            postgres: health.postgres,
            redis: health.redis,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        },
    )
}
