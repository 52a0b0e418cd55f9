//! API Routes
//!
//! Route definitions for all API endpoints. Inventory routes sit behind the
//! auth gate with the role policy; the three session-bound auth routes sit
//! behind the gate alone.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use stockroom_auth::AuthService;

use crate::error::auth_rejection;
use crate::handlers;
use crate::state::AppState;

/// Create `/api` routes
pub fn api_routes(auth: &AuthService) -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth_routes(auth))
        .merge(inventory_routes(auth))
}

/// Authentication routes
fn auth_routes(auth: &AuthService) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/auth/refresh-token", post(handlers::auth::refresh_token));

    let protected = Router::new()
        .route("/api/auth/change-password", post(handlers::auth::change_password))
        .route("/api/auth/change-role", post(handlers::auth::change_role))
        .route("/api/auth/signout", post(handlers::auth::signout))
        .route_layer(auth.layer().with_rejection(auth_rejection));

    public.merge(protected)
}

/// Inventory routes (bearer + role policy)
fn inventory_routes(auth: &AuthService) -> Router<Arc<AppState>> {
    use handlers::{categories, products, stocks, warehouses};

    Router::new()
        // Products
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        // Categories
        .route(
            "/api/product-categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/product-categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // Stock levels
        .route(
            "/api/product-stocks",
            get(stocks::list_stocks).post(stocks::create_stock),
        )
        .route(
            "/api/product-stocks/:id",
            get(stocks::get_stock)
                .put(stocks::update_stock)
                .delete(stocks::delete_stock),
        )
        // Warehouse locations
        .route(
            "/api/warehouse-locations",
            get(warehouses::list_warehouses).post(warehouses::create_warehouse),
        )
        .route(
            "/api/warehouse-locations/:id",
            get(warehouses::get_warehouse)
                .put(warehouses::update_warehouse)
                .delete(warehouses::delete_warehouse),
        )
        .route_layer(auth.policy_layer().with_rejection(auth_rejection))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
