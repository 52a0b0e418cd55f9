//! Product Stock Handlers
//!
//! Creating a stock level also records an inbound stock movement. The
//! movement is an audit entry only: if it cannot be written the stock level
//! is still returned.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use stockroom_db::{MovementType, NewStockMovement};

use super::store_error;
use crate::dto::{paged, CreateStockRequest, Envelope, ListQuery, StockResponse, UpdateStockRequest};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, Listing, ResourceId, ValidatedJson};
use crate::state::AppState;

const RESOURCE: &str = "Product stock";

/// Create a stock level
#[utoipa::path(
    post,
    path = "/api/product-stocks",
    tag = "Product Stocks",
    request_body = CreateStockRequest,
    responses(
        (status = 201, description = "Product stock created successfully", body = StockResponse),
        (status = 400, description = "Invalid request or unknown product/warehouse"),
        (status = 403, description = "Requires super_admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_stock(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateStockRequest>,
) -> ApiResult<Envelope<StockResponse>> {
    let stock = state
        .inventory()
        .create_stock(request.into_new(user.user_id))
        .await?;

    let movement = NewStockMovement {
        product_id: stock.product_id,
        movement_type: MovementType::Inbound,
        quantity: stock.quantity,
        reference_note: "Initial stock".to_string(),
        created_by: Some(user.user_id),
    };
    if let Err(e) = state.inventory().record_movement(movement).await {
        tracing::warn!(
            stock_id = %stock.id,
            product_id = %stock.product_id,
            error = %e,
            "Failed to record inbound stock movement"
        );
    }

    tracing::info!(stock_id = %stock.id, user_id = %user.user_id, "Product stock created");
    Ok(Envelope::success(StatusCode::CREATED, "Product stock created successfully", stock.into()))
}

/// Get a stock level by id
#[utoipa::path(
    get,
    path = "/api/product-stocks/{id}",
    tag = "Product Stocks",
    params(("id" = uuid::Uuid, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Product stock retrieved successfully", body = StockResponse),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<StockResponse>> {
    let stock = state
        .inventory()
        .find_stock(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(RESOURCE.to_string()))?;

    Ok(Envelope::success(StatusCode::OK, "Product stock retrieved successfully", stock.into()))
}

/// Set the quantity of a stock level
#[utoipa::path(
    put,
    path = "/api/product-stocks/{id}",
    tag = "Product Stocks",
    params(("id" = uuid::Uuid, Path, description = "Stock id")),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Product stock updated successfully", body = StockResponse),
        (status = 403, description = "Requires super_admin"),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<UpdateStockRequest>,
) -> ApiResult<Envelope<StockResponse>> {
    let stock = state
        .inventory()
        .update_stock(
            id,
            stockroom_db::ProductStockChanges {
                quantity: request.quantity,
                updated_by: Some(user.user_id),
            },
        )
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Product stock updated successfully", stock.into()))
}

/// Delete a stock level
#[utoipa::path(
    delete,
    path = "/api/product-stocks/{id}",
    tag = "Product Stocks",
    params(("id" = uuid::Uuid, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Product stock deleted successfully"),
        (status = 403, description = "Requires super_admin"),
        (status = 404, description = "Stock not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<()>> {
    state
        .inventory()
        .delete_stock(id)
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Product stock deleted successfully", ()))
}

/// List stock levels
#[utoipa::path(
    get,
    path = "/api/product-stocks",
    tag = "Product Stocks",
    params(ListQuery),
    responses(
        (status = 200, description = "Product stocks list retrieved successfully", body = [StockResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    Listing(query): Listing,
) -> ApiResult<Envelope<Vec<StockResponse>>> {
    let page = state.inventory().list_stocks(&query.to_params()).await?;

    Ok(paged("Product stocks list retrieved successfully", page, &query))
}
