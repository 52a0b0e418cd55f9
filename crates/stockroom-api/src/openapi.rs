//! OpenAPI Documentation
//!
//! OpenAPI 3.0 document for the Stockroom API, served at
//! `/api-docs/openapi.json`. Response bodies listed per operation are the
//! `payload.data` of the standard envelope.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::dto;
use crate::handlers;

/// Stockroom API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        description = "Authentication and inventory management. Every response is wrapped in `{status, status_code, message, payload: {data, pagination, errors}}`.",
        version = "0.1.0"
    ),
    paths(
        // Health
        handlers::health::health_check,
        // Auth
        handlers::auth::signup,
        handlers::auth::signin,
        handlers::auth::refresh_token,
        handlers::auth::change_password,
        handlers::auth::change_role,
        handlers::auth::signout,
        // Products
        handlers::products::create_product,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::list_products,
        // Categories
        handlers::categories::create_category,
        handlers::categories::get_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::categories::list_categories,
        // Stocks
        handlers::stocks::create_stock,
        handlers::stocks::get_stock,
        handlers::stocks::update_stock,
        handlers::stocks::delete_stock,
        handlers::stocks::list_stocks,
        // Warehouses
        handlers::warehouses::create_warehouse,
        handlers::warehouses::get_warehouse,
        handlers::warehouses::update_warehouse,
        handlers::warehouses::delete_warehouse,
        handlers::warehouses::list_warehouses,
    ),
    components(
        schemas(
            // Common
            dto::ResponseStatus,
            dto::FieldError,
            dto::Pagination,
            handlers::health::HealthResponse,
            // Auth
            dto::SignupRequest,
            dto::SignupResponse,
            dto::SigninRequest,
            dto::TokenPairResponse,
            dto::ChangePasswordRequest,
            dto::ChangeRoleRequest,
            dto::RefreshTokenRequest,
            dto::SignoutRequest,
            // Inventory
            dto::CreateCategoryRequest,
            dto::UpdateCategoryRequest,
            dto::CategoryResponse,
            dto::CreateProductRequest,
            dto::UpdateProductRequest,
            dto::ProductResponse,
            dto::CreateWarehouseRequest,
            dto::UpdateWarehouseRequest,
            dto::WarehouseResponse,
            dto::CreateStockRequest,
            dto::UpdateStockRequest,
            dto::StockResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Signup, signin and session management"),
        (name = "Products", description = "Products (writes need admin)"),
        (name = "Product Categories", description = "Product categories (writes need admin)"),
        (name = "Product Stocks", description = "Stock levels (writes need super_admin)"),
        (name = "Warehouse Locations", description = "Warehouse locations (writes need super_admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier
pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
