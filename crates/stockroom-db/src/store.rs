//! Storage traits consumed by the auth and API layers.
//!
//! Production implementations live in [`crate::repos`] (PostgreSQL) and
//! [`crate::cache`] (Redis). In-memory implementations for tests are in
//! `crate::mock` behind the `mock` feature.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::*;
use crate::DbResult;

/// Durable store for identities, credentials, roles and refresh sessions.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<DbUser>>;

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<DbUser>>;

    async fn find_security(&self, user_id: Uuid) -> DbResult<Option<DbUserSecurity>>;

    /// Create user, profile, credential and role atomically.
    ///
    /// Returns `DbError::Duplicate` when the email is taken; nothing is
    /// written in that case.
    async fn create_user_bundle(&self, bundle: NewUserBundle) -> DbResult<DbUser>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> DbResult<()>;

    /// Current role value, `None` if no assignment exists.
    async fn find_role(&self, user_id: Uuid) -> DbResult<Option<String>>;

    /// Replace the user's role assignment, creating it if missing.
    async fn assign_role(&self, user_id: Uuid, role: &str) -> DbResult<()>;

    /// Insert or overwrite the session for `(user_id, device_id)`.
    ///
    /// Overwriting resets `last_used_at` and clears `revoked_at`.
    async fn upsert_refresh_session(&self, session: NewRefreshSession) -> DbResult<DbRefreshSession>;

    async fn find_refresh_session(
        &self,
        token_hash: &str,
        device_id: &str,
    ) -> DbResult<Option<DbRefreshSession>>;

    /// Swap the token hash only if it still equals `expected_hash` and the
    /// session is not revoked. Returns whether the swap happened.
    async fn rotate_refresh_session(&self, rotation: RefreshRotation) -> DbResult<bool>;

    /// Mark sessions with this hash revoked. Returns the number affected.
    async fn revoke_refresh_session(&self, token_hash: &str) -> DbResult<u64>;

    /// Mark the user's session on this device revoked. Returns the number affected.
    async fn revoke_refresh_session_for_device(&self, user_id: Uuid, device_id: &str) -> DbResult<u64>;

    async fn ping(&self) -> DbResult<()>;
}

/// Fast key-value store holding the token ledger and rate counters.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `SET key value EX ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()>;

    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    async fn delete(&self, key: &str) -> DbResult<bool>;

    /// `INCR key`, returning the post-increment value.
    async fn incr(&self, key: &str) -> DbResult<i64>;

    async fn expire(&self, key: &str, ttl: Duration) -> DbResult<bool>;

    async fn ping(&self) -> DbResult<()>;
}

/// Persistence for the inventory resources.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // Categories
    async fn create_category(&self, new: NewProductCategory) -> DbResult<DbProductCategory>;
    async fn find_category(&self, id: Uuid) -> DbResult<Option<DbProductCategory>>;
    async fn update_category(
        &self,
        id: Uuid,
        changes: ProductCategoryChanges,
    ) -> DbResult<DbProductCategory>;
    async fn delete_category(&self, id: Uuid) -> DbResult<()>;
    async fn list_categories(&self, params: &ListParams) -> DbResult<Page<DbProductCategory>>;

    // Products
    async fn create_product(&self, new: NewProduct) -> DbResult<DbProduct>;
    async fn find_product(&self, id: Uuid) -> DbResult<Option<DbProduct>>;
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> DbResult<DbProduct>;
    async fn delete_product(&self, id: Uuid) -> DbResult<()>;
    async fn list_products(&self, params: &ListParams) -> DbResult<Page<DbProduct>>;

    // Warehouse locations
    async fn create_warehouse(&self, new: NewWarehouseLocation) -> DbResult<DbWarehouseLocation>;
    async fn find_warehouse(&self, id: Uuid) -> DbResult<Option<DbWarehouseLocation>>;
    async fn update_warehouse(
        &self,
        id: Uuid,
        changes: WarehouseLocationChanges,
    ) -> DbResult<DbWarehouseLocation>;
    async fn delete_warehouse(&self, id: Uuid) -> DbResult<()>;
    async fn list_warehouses(&self, params: &ListParams) -> DbResult<Page<DbWarehouseLocation>>;

    // Stock levels
    async fn create_stock(&self, new: NewProductStock) -> DbResult<DbProductStock>;
    async fn find_stock(&self, id: Uuid) -> DbResult<Option<DbProductStock>>;
    async fn update_stock(&self, id: Uuid, changes: ProductStockChanges) -> DbResult<DbProductStock>;
    async fn delete_stock(&self, id: Uuid) -> DbResult<()>;
    async fn list_stocks(&self, params: &ListParams) -> DbResult<Page<DbProductStock>>;

    async fn record_movement(&self, movement: NewStockMovement) -> DbResult<DbStockMovement>;
}
