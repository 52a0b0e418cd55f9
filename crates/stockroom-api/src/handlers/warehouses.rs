//! Warehouse Location Handlers

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::store_error;
use crate::dto::{
    paged, CreateWarehouseRequest, Envelope, ListQuery, UpdateWarehouseRequest, WarehouseResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Listing, ResourceId, ValidatedJson};
use crate::state::AppState;

const RESOURCE: &str = "Warehouse location";

/// Create a warehouse location
#[utoipa::path(
    post,
    path = "/api/warehouse-locations",
    tag = "Warehouse Locations",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse location created successfully", body = WarehouseResponse),
        (status = 403, description = "Requires super_admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateWarehouseRequest>,
) -> ApiResult<Envelope<WarehouseResponse>> {
    let warehouse = state.inventory().create_warehouse(request.into()).await?;

    Ok(Envelope::success(
        StatusCode::CREATED,
        "Warehouse location created successfully",
        warehouse.into(),
    ))
}

/// Get a warehouse location by id
#[utoipa::path(
    get,
    path = "/api/warehouse-locations/{id}",
    tag = "Warehouse Locations",
    params(("id" = uuid::Uuid, Path, description = "Warehouse location id")),
    responses(
        (status = 200, description = "Warehouse location retrieved successfully", body = WarehouseResponse),
        (status = 404, description = "Warehouse location not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<WarehouseResponse>> {
    let warehouse = state
        .inventory()
        .find_warehouse(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(RESOURCE.to_string()))?;

    Ok(Envelope::success(
        StatusCode::OK,
        "Warehouse location retrieved successfully",
        warehouse.into(),
    ))
}

/// Update a warehouse location
#[utoipa::path(
    put,
    path = "/api/warehouse-locations/{id}",
    tag = "Warehouse Locations",
    params(("id" = uuid::Uuid, Path, description = "Warehouse location id")),
    request_body = UpdateWarehouseRequest,
    responses(
        (status = 200, description = "Warehouse location updated successfully", body = WarehouseResponse),
        (status = 404, description = "Warehouse location not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_warehouse(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<UpdateWarehouseRequest>,
) -> ApiResult<Envelope<WarehouseResponse>> {
    let warehouse = state
        .inventory()
        .update_warehouse(id, request.into())
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(
        StatusCode::OK,
        "Warehouse location updated successfully",
        warehouse.into(),
    ))
}

/// Delete a warehouse location
#[utoipa::path(
    delete,
    path = "/api/warehouse-locations/{id}",
    tag = "Warehouse Locations",
    params(("id" = uuid::Uuid, Path, description = "Warehouse location id")),
    responses(
        (status = 200, description = "Warehouse location deleted successfully"),
        (status = 404, description = "Warehouse location not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_warehouse(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> ApiResult<Envelope<()>> {
    state
        .inventory()
        .delete_warehouse(id)
        .await
        .map_err(store_error(RESOURCE))?;

    Ok(Envelope::success(StatusCode::OK, "Warehouse location deleted successfully", ()))
}

/// List warehouse locations
#[utoipa::path(
    get,
    path = "/api/warehouse-locations",
    tag = "Warehouse Locations",
    params(ListQuery),
    responses(
        (status = 200, description = "Warehouse locations list retrieved successfully", body = [WarehouseResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_warehouses(
    State(state): State<Arc<AppState>>,
    Listing(query): Listing,
) -> ApiResult<Envelope<Vec<WarehouseResponse>>> {
    let page = state.inventory().list_warehouses(&query.to_params()).await?;

    Ok(paged("Warehouse locations list retrieved successfully", page, &query))
}
