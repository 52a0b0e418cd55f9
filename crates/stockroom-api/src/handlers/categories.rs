//! Product Category Handlers

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::store_error;
use crate::dto::{
    paged, CategoryResponse, CreateCategoryRequest, Envelope, ListQuery, UpdateCategoryRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Listing, ResourceId, ValidatedJson};
use crate::state::AppState;

const RESOURCE: &str = "Product category";

/// Create a product category
#[utoipa::path(
    post,
    path = "/api/product-categories",
    tag = "Product Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Product category created successfully", body = CategoryResponse),
        (status = 409, description = "Category name already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> ApiResult<Envelope<CategoryResponse>> {
    let category = state.inventory().create_category(request.into()).await?;

    Ok(Envelope::success(
        StatusCode::CREATED,
        "Product category created successfully",
        category.into(),
    ))
}

/// Get a product category by id
#[utoipa::path(
    get,
    path = "/api/product-categories/{id}",
    tag = "Product Categories",
    params(("id" = uuid::Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Product category retrieved successfully", body = CategoryResponse),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<CategoryResponse>> {
    let category = state
        .inventory()
        .find_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(RESOURCE.to_string()))?;

    Ok(Envelope::success(
        StatusCode::OK,
        "Product category retrieved successfully",
        category.into(),
    ))
}

/// Update a product category
#[utoipa::path(
    put,
    path = "/api/product-categories/{id}",
    tag = "Product Categories",
    params(("id" = uuid::Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Product category updated successfully", body = CategoryResponse),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<Envelope<CategoryResponse>> {
    let category = state
        .inventory()
        .update_category(id, request.into())
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(
        StatusCode::OK,
        "Product category updated successfully",
        category.into(),
    ))
}

/// Delete a product category
#[utoipa::path(
    delete,
    path = "/api/product-categories/{id}",
    tag = "Product Categories",
    params(("id" = uuid::Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Product category deleted successfully"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<()>> {
    state
        .inventory()
        .delete_category(id)
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Product category deleted successfully", ()))
}

/// List product categories
#[utoipa::path(
    get,
    path = "/api/product-categories",
    tag = "Product Categories",
    params(ListQuery),
    responses(
        (status = 200, description = "Product categories list retrieved successfully", body = [CategoryResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Listing(query): Listing,
) -> ApiResult<Envelope<Vec<CategoryResponse>>> {
    let page = state.inventory().list_categories(&query.to_params()).await?;

    Ok(paged("Product categories list retrieved successfully", page, &query))
}
