//! Product Handlers

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::store_error;
use crate::dto::{paged, CreateProductRequest, Envelope, ListQuery, ProductResponse, UpdateProductRequest};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, Listing, ResourceId, ValidatedJson};
use crate::state::AppState;

const RESOURCE: &str = "Product";

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, description = "Invalid request or unknown category"),
        (status = 403, description = "Role not allowed"),
        (status = 409, description = "SKU already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> ApiResult<Envelope<ProductResponse>> {
    let product = state
        .inventory()
        .create_product(request.into_new(user.user_id))
        .await?;

    tracing::info!(product_id = %product.id, user_id = %user.user_id, "Product created");
    Ok(Envelope::success(StatusCode::CREATED, "Product created successfully", product.into()))
}

/// Get a product by id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<ProductResponse>> {
    let product = state
        .inventory()
        .find_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(RESOURCE.to_string()))?;

    Ok(Envelope::success(StatusCode::OK, "Product retrieved successfully", product.into()))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<Envelope<ProductResponse>> {
    let product = state
        .inventory()
        .update_product(id, request.into())
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Product updated successfully", product.into()))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted successfully"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<()>> {
    state
        .inventory()
        .delete_product(id)
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Product deleted successfully", ()))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ListQuery),
    responses(
        (status = 200, description = "Products list retrieved successfully", body = [ProductResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Listing(query): Listing,
) -> ApiResult<Envelope<Vec<ProductResponse>>> {
    let page = state.inventory().list_products(&query.to_params()).await?;

    Ok(paged("Products list retrieved successfully", page, &query))
}
