//! API Integration Tests
//!
//! Drives the full router (auth gate, role policy, handlers, envelope) over
//! the in-memory stores.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use stockroom_api::{create_router, ApiConfig, AppState};
use stockroom_auth::{AuthConfig, AuthService};
use stockroom_db::mock::MemoryStores;
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse-1";

struct TestApp {
    router: Router,
    stores: MemoryStores,
}

fn auth_config(max_requests: u32) -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt.access_secret = "access-secret-key-for-tests-min-32-bytes!".to_string();
    config.jwt.refresh_secret = "refresh-secret-key-for-tests-min-32-bytes".to_string();
    config.password.memory_cost = 4096;
    config.password.time_cost = 1;
    config.rate_limit.max_requests = max_requests;
    config
}

fn test_app_with_budget(max_requests: u32) -> TestApp {
    let stores = MemoryStores::new();
    let auth = AuthService::new(&stores.stores(), auth_config(max_requests)).unwrap();
    let state = Arc::new(AppState::new(stores.stores(), Arc::new(auth)));

    TestApp {
        router: create_router(state, ApiConfig::default()),
        stores,
    }
}

fn test_app() -> TestApp {
    test_app_with_budget(1000)
}

/// Make a request and get the status and JSON body
async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn signup(app: &TestApp, email: &str) -> Value {
    let (status, body) = json_request(
        &app.router,
        "POST",
        "/api/auth/signup",
        &[],
        Some(json!({"email": email, "password": PASSWORD, "full_name": "Test User"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

/// Returns (access_token, refresh_token)
async fn signin(app: &TestApp, email: &str, device: &str) -> (String, String) {
    let (status, body) = json_request(
        &app.router,
        "POST",
        "/api/auth/signin",
        &[("X-Device-ID", device)],
        Some(json!({"email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let data = &body["payload"]["data"];
    (
        data["access_token"].as_str().unwrap().to_string(),
        data["refresh_token"].as_str().unwrap().to_string(),
    )
}

/// Sign up, take `role`, and sign in again so the token carries it
async fn user_with_role(app: &TestApp, email: &str, role: &str) -> String {
    signup(app, email).await;
    let (access, _) = signin(app, email, "setup").await;

    if role != "user" {
        let auth = bearer(&access);
        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/change-role",
            &[("Authorization", &auth)],
            Some(json!({"role": role})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    signin(app, email, "main").await.0
}

// =============================================================================
// Public Endpoint Tests (No Auth Required)
// =============================================================================

mod public_endpoints {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let (status, body) = json_request(&app.router, "GET", "/health", &[], None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["payload"]["data"]["postgres"], true);
        assert_eq!(body["payload"]["data"]["redis"], true);
    }

    #[tokio::test]
    async fn test_health_reports_store_outage() {
        let app = test_app();
        app.stores.sessions.fail_all(true);

        let (status, body) = json_request(&app.router, "GET", "/health", &[], None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["payload"]["data"]["redis"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_uses_envelope() {
        let app = test_app();
        let (status, body) = json_request(&app.router, "GET", "/api/nope", &[], None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["status_code"], 404);
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let app = test_app();
        let (status, body) = json_request(&app.router, "GET", "/api-docs/openapi.json", &[], None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/auth/signup"].is_object());
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let app = test_app();
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}

// =============================================================================
// Authentication Tests
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_signup_returns_created_user() {
        let app = test_app();
        let body = signup(&app, "new@example.com").await;

        assert_eq!(body["status"], "success");
        assert_eq!(body["status_code"], 201);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["payload"]["data"]["email"], "new@example.com");
        assert!(body["payload"]["data"]["id"].is_string());
        assert_eq!(app.stores.credentials.user_count(), 1);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let app = test_app();
        signup(&app, "dup@example.com").await;

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signup",
            &[],
            Some(json!({"email": "dup@example.com", "password": PASSWORD, "full_name": "Again"})),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "error");
        assert_eq!(app.stores.credentials.user_count(), 1);
    }

    #[tokio::test]
    async fn test_signup_validation_lists_fields() {
        let app = test_app();
        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signup",
            &[],
            Some(json!({"email": "not-an-email", "password": "short", "full_name": "X"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        let fields: Vec<&str> = body["payload"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[tokio::test]
    async fn test_signup_rejects_unknown_fields() {
        let app = test_app();
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/signup",
            &[],
            Some(json!({"email": "a@example.com", "password": PASSWORD, "full_name": "A", "role": "super_admin"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.stores.credentials.user_count(), 0);
    }

    #[tokio::test]
    async fn test_signin_requires_device_id() {
        let app = test_app();
        signup(&app, "dev@example.com").await;

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signin",
            &[],
            Some(json!({"email": "dev@example.com", "password": PASSWORD})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["payload"]["errors"][0]["field"], "X-Device-ID");
        assert_eq!(body["payload"]["errors"][0]["message"], "Device ID required");
    }

    #[tokio::test]
    async fn test_signin_failures_are_indistinguishable() {
        let app = test_app();
        signup(&app, "known@example.com").await;

        let (wrong_status, wrong_body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signin",
            &[("X-Device-ID", "d1")],
            Some(json!({"email": "known@example.com", "password": "wrong-password"})),
        )
        .await;
        let (unknown_status, unknown_body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signin",
            &[("X-Device-ID", "d1")],
            Some(json!({"email": "ghost@example.com", "password": PASSWORD})),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
        assert_eq!(wrong_body["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_signin_success_opens_device_session() {
        let app = test_app();
        let created = signup(&app, "s@example.com").await;
        let user_id = created["payload"]["data"]["id"].as_str().unwrap().parse().unwrap();

        let (access, refresh) = signin(&app, "s@example.com", "phone").await;
        assert_ne!(access, refresh);
        assert!(app.stores.sessions.contains(&access));

        let sessions = app.stores.credentials.sessions_for(user_id);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].device_id, "phone");
    }

    #[tokio::test]
    async fn test_signin_store_outage_fails() {
        let app = test_app();
        signup(&app, "o@example.com").await;
        app.stores.sessions.fail_all(true);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signin",
            &[("X-Device-ID", "d1")],
            Some(json!({"email": "o@example.com", "password": PASSWORD})),
        )
        .await;

        assert!(status.is_server_error());
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let app = test_app();
        signup(&app, "r@example.com").await;
        let (_, refresh) = signin(&app, "r@example.com", "laptop").await;

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "laptop")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Token refreshed successfully");
        let rotated = body["payload"]["data"]["refresh_token"].as_str().unwrap().to_string();
        assert_ne!(rotated, refresh);

        // The presented token is spent
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "laptop")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "laptop")],
            Some(json!({"refresh_token": rotated})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_is_bound_to_device() {
        let app = test_app();
        signup(&app, "b@example.com").await;
        let (_, refresh) = signin(&app, "b@example.com", "laptop").await;

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "tablet")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_signout_revokes_refresh_session() {
        let app = test_app();
        signup(&app, "out@example.com").await;
        let (access, refresh) = signin(&app, "out@example.com", "d1").await;
        let auth = bearer(&access);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signout",
            &[("Authorization", &auth)],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Signout successful");

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "d1")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // The access token stays registered until it expires
        assert!(app.stores.sessions.contains(&access));
    }

    #[tokio::test]
    async fn test_signout_without_body() {
        let app = test_app();
        signup(&app, "nb@example.com").await;
        let (access, refresh) = signin(&app, "nb@example.com", "d1").await;
        let (_, other_refresh) = signin(&app, "nb@example.com", "d2").await;
        let auth = bearer(&access);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/signout",
            &[("Authorization", &auth), ("X-Device-ID", "d1")],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "d1")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Other devices keep their sessions
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "d2")],
            Some(json!({"refresh_token": other_refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signout_needs_token_or_device() {
        let app = test_app();
        signup(&app, "nd@example.com").await;
        let (access, refresh) = signin(&app, "nd@example.com", "d1").await;
        let auth = bearer(&access);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/signout",
            &[("Authorization", &auth)],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["payload"]["errors"][0]["field"], "X-Device-ID");

        // Nothing was revoked
        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/refresh-token",
            &[("X-Device-ID", "d1")],
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = test_app();
        signup(&app, "pw@example.com").await;
        let (access, _) = signin(&app, "pw@example.com", "d1").await;
        let auth = bearer(&access);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/change-password",
            &[("Authorization", &auth)],
            Some(json!({"old_password": "not-my-password", "new_password": "another-pass-2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/change-password",
            &[("Authorization", &auth)],
            Some(json!({"old_password": PASSWORD, "new_password": "another-pass-2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/auth/signin",
            &[("X-Device-ID", "d1")],
            Some(json!({"email": "pw@example.com", "password": "another-pass-2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_role_rejects_unknown_role() {
        let app = test_app();
        signup(&app, "role@example.com").await;
        let (access, _) = signin(&app, "role@example.com", "d1").await;
        let auth = bearer(&access);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/auth/change-role",
            &[("Authorization", &auth)],
            Some(json!({"role": "owner"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_protected_auth_routes_need_bearer() {
        let app = test_app();
        for path in ["/api/auth/change-password", "/api/auth/change-role", "/api/auth/signout"] {
            let (status, body) = json_request(&app.router, "POST", path, &[], Some(json!({}))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
            assert_eq!(body["message"], "Unauthorized");
        }
    }
}

// =============================================================================
// Gate & Policy Tests
// =============================================================================

mod gate {
    use super::*;

    #[tokio::test]
    async fn test_forged_and_refresh_tokens_rejected() {
        let app = test_app();
        signup(&app, "g@example.com").await;
        let (_, refresh) = signin(&app, "g@example.com", "d1").await;

        for token in ["forged.token.value", refresh.as_str()] {
            let auth = bearer(token);
            let (status, body) =
                json_request(&app.router, "GET", "/api/products", &[("Authorization", &auth)], None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_rate_limit_per_token() {
        let app = test_app_with_budget(1);
        signup(&app, "rl@example.com").await;
        let (access, _) = signin(&app, "rl@example.com", "d1").await;
        let auth = bearer(&access);

        let (status, _) =
            json_request(&app.router, "GET", "/api/products", &[("Authorization", &auth)], None).await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/products")
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "10");
    }

    #[tokio::test]
    async fn test_user_reads_but_cannot_write() {
        let app = test_app();
        let user = bearer(&user_with_role(&app, "u@example.com", "user").await);

        let (status, _) =
            json_request(&app.router, "GET", "/api/product-categories", &[("Authorization", &user)], None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/product-categories",
            &[("Authorization", &user)],
            Some(json!({"name": "Tools"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_admin_cannot_write_stock_or_warehouses() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "a@example.com", "admin").await);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/warehouse-locations",
            &[("Authorization", &admin)],
            Some(json!({"name": "North"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(app.stores.inventory.warehouse_count(), 0);

        let (status, _) =
            json_request(&app.router, "GET", "/api/warehouse-locations", &[("Authorization", &admin)], None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// =============================================================================
// Inventory Tests
// =============================================================================

mod inventory {
    use super::*;

    async fn create(app: &TestApp, auth: &str, path: &str, body: Value) -> Value {
        let (status, body) =
            json_request(&app.router, "POST", path, &[("Authorization", auth)], Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["payload"]["data"].clone()
    }

    #[tokio::test]
    async fn test_product_crud() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "pa@example.com", "admin").await);

        let category = create(&app, &admin, "/api/product-categories", json!({"name": "Fasteners"})).await;
        let product = create(
            &app,
            &admin,
            "/api/products",
            json!({"name": "Bolt M6", "sku": "BLT-M6", "category_id": category["id"]}),
        )
        .await;
        assert_eq!(product["category_name"], "Fasteners");

        let path = format!("/api/products/{}", product["id"].as_str().unwrap());
        let (status, body) = json_request(
            &app.router,
            "PUT",
            &path,
            &[("Authorization", &admin)],
            Some(json!({"name": "Bolt M6x20"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payload"]["data"]["name"], "Bolt M6x20");
        assert_eq!(body["payload"]["data"]["sku"], "BLT-M6");

        let (status, _) = json_request(&app.router, "DELETE", &path, &[("Authorization", &admin)], None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = json_request(&app.router, "GET", &path, &[("Authorization", &admin)], None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
    }

    #[tokio::test]
    async fn test_duplicate_sku_and_unknown_category() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "sku@example.com", "admin").await);
        let category = create(&app, &admin, "/api/product-categories", json!({"name": "Paint"})).await;
        create(
            &app,
            &admin,
            "/api/products",
            json!({"name": "White", "sku": "PNT-W", "category_id": category["id"]}),
        )
        .await;

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/products",
            &[("Authorization", &admin)],
            Some(json!({"name": "White 2", "sku": "PNT-W", "category_id": category["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/products",
            &[("Authorization", &admin)],
            Some(json!({"name": "Ghost", "sku": "PNT-G", "category_id": uuid::Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let app = test_app();
        let user = bearer(&user_with_role(&app, "id@example.com", "user").await);

        let (status, body) =
            json_request(&app.router, "GET", "/api/products/not-a-uuid", &[("Authorization", &user)], None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid ID format");
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "list@example.com", "admin").await);
        for name in ["A", "B", "C"] {
            create(&app, &admin, "/api/product-categories", json!({"name": name})).await;
        }

        let (status, body) = json_request(
            &app.router,
            "GET",
            "/api/product-categories?page=1&limit=2",
            &[("Authorization", &admin)],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payload"]["data"].as_array().unwrap().len(), 2);

        let pagination = &body["payload"]["pagination"];
        assert_eq!(pagination["total_items"], 3);
        assert_eq!(pagination["total_pages"], 2);
        assert_eq!(pagination["has_next_page"], true);
        assert_eq!(pagination["next_page"], 2);
        assert_eq!(pagination["current_page"], 1);
    }

    #[tokio::test]
    async fn test_stock_create_records_inbound_movement() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "sa@example.com", "super_admin").await);

        let category = create(&app, &admin, "/api/product-categories", json!({"name": "Glue"})).await;
        let product = create(
            &app,
            &admin,
            "/api/products",
            json!({"name": "Epoxy", "sku": "GLU-E", "category_id": category["id"]}),
        )
        .await;
        let warehouse = create(&app, &admin, "/api/warehouse-locations", json!({"name": "Main"})).await;

        let stock = create(
            &app,
            &admin,
            "/api/product-stocks",
            json!({"product_id": product["id"], "warehouse_location_id": warehouse["id"], "quantity": 4}),
        )
        .await;
        assert_eq!(stock["status"], "low-stock");

        let movements = app.stores.inventory.movements();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, "inbound");
        assert_eq!(movements[0].quantity, 4);

        let path = format!("/api/product-stocks/{}", stock["id"].as_str().unwrap());
        let (status, body) = json_request(
            &app.router,
            "PUT",
            &path,
            &[("Authorization", &admin)],
            Some(json!({"quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payload"]["data"]["status"], "out-of-stock");
    }

    #[tokio::test]
    async fn test_stock_survives_movement_failure() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "mv@example.com", "super_admin").await);

        let category = create(&app, &admin, "/api/product-categories", json!({"name": "Tape"})).await;
        let product = create(
            &app,
            &admin,
            "/api/products",
            json!({"name": "Duct", "sku": "TAP-D", "category_id": category["id"]}),
        )
        .await;
        let warehouse = create(&app, &admin, "/api/warehouse-locations", json!({"name": "Annex"})).await;
        app.stores.inventory.fail_movements(true);

        let stock = create(
            &app,
            &admin,
            "/api/product-stocks",
            json!({"product_id": product["id"], "warehouse_location_id": warehouse["id"], "quantity": 25}),
        )
        .await;
        assert_eq!(stock["status"], "available");
        assert!(app.stores.inventory.movements().is_empty());
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let app = test_app();
        let admin = bearer(&user_with_role(&app, "neg@example.com", "super_admin").await);

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/product-stocks",
            &[("Authorization", &admin)],
            Some(json!({
                "product_id": uuid::Uuid::new_v4(),
                "warehouse_location_id": uuid::Uuid::new_v4(),
                "quantity": -1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["payload"]["errors"][0]["field"], "quantity");
    }
}
