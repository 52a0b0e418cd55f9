//! In-memory store implementations for tests.
//!
//! Semantics follow the PostgreSQL/Redis implementations closely enough for
//! the auth engine and router tests: unique email, per-device session
//! upsert, compare-and-swap rotation, soft deletes, and TTL expiry driven by
//! the tokio clock so tests can use `tokio::time::pause`/`advance`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::store::{CredentialStore, InventoryStore, SessionStore};
use crate::*;

/// Concrete in-memory stores, kept alongside the trait-object view so tests
/// can both inject and inspect them.
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub credentials: Arc<MemoryCredentialStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub inventory: Arc<MemoryInventoryStore>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            credentials: self.credentials.clone(),
            sessions: self.sessions.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

// ============================================================================
// Credential Store
// ============================================================================

#[derive(Default)]
struct CredentialState {
    users: HashMap<Uuid, DbUser>,
    profiles: HashMap<Uuid, DbUserProfile>,
    securities: HashMap<Uuid, DbUserSecurity>,
    roles: HashMap<Uuid, String>,
    sessions: HashMap<Uuid, DbRefreshSession>,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    state: Mutex<CredentialState>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All refresh sessions for a user, across devices
    pub fn sessions_for(&self, user_id: Uuid) -> Vec<DbRefreshSession> {
        self.state
            .lock()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Overwrite a stored session, e.g. to backdate its expiry
    pub fn put_session(&self, session: DbRefreshSession) {
        self.state.lock().sessions.insert(session.id, session);
    }

    pub fn set_status(&self, user_id: Uuid, status: &str) {
        if let Some(user) = self.state.lock().users.get_mut(&user_id) {
            user.status = status.to_string();
        }
    }

    /// Remove a role assignment so lookups miss
    pub fn clear_role(&self, user_id: Uuid) {
        self.state.lock().roles.remove(&user_id);
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().users.len()
    }

    pub fn profile_name(&self, user_id: Uuid) -> Option<String> {
        self.state.lock().profiles.get(&user_id).map(|p| p.full_name.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<DbUser>> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<DbUser>> {
        Ok(self
            .state
            .lock()
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn find_security(&self, user_id: Uuid) -> DbResult<Option<DbUserSecurity>> {
        Ok(self.state.lock().securities.get(&user_id).cloned())
    }

    async fn create_user_bundle(&self, bundle: NewUserBundle) -> DbResult<DbUser> {
        let mut state = self.state.lock();
        if state.users.values().any(|u| u.email == bundle.email) {
            return Err(DbError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = DbUser {
            id: Uuid::new_v4(),
            email: bundle.email,
            status: bundle.status,
            email_verified: bundle.email_verified,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.profiles.insert(
            user.id,
            DbUserProfile {
                id: Uuid::new_v4(),
                user_id: user.id,
                full_name: bundle.full_name,
                created_at: now,
                updated_at: now,
            },
        );
        state.securities.insert(
            user.id,
            DbUserSecurity {
                id: Uuid::new_v4(),
                user_id: user.id,
                password_hash: bundle.password_hash,
                updated_at: now,
            },
        );
        state.roles.insert(user.id, bundle.role);
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> DbResult<()> {
        let mut state = self.state.lock();
        let security = state
            .securities
            .get_mut(&user_id)
            .ok_or_else(|| DbError::NotFound(format!("credentials for user {}", user_id)))?;
        security.password_hash = password_hash.to_string();
        security.updated_at = Utc::now();
        Ok(())
    }

    async fn find_role(&self, user_id: Uuid) -> DbResult<Option<String>> {
        Ok(self.state.lock().roles.get(&user_id).cloned())
    }

    async fn assign_role(&self, user_id: Uuid, role: &str) -> DbResult<()> {
        let mut state = self.state.lock();
        if !state.users.contains_key(&user_id) {
            return Err(DbError::Constraint("user_roles_user_id_fkey".to_string()));
        }
        state.roles.insert(user_id, role.to_string());
        Ok(())
    }

    async fn upsert_refresh_session(&self, session: NewRefreshSession) -> DbResult<DbRefreshSession> {
        let mut state = self.state.lock();
        let now = Utc::now();

        let existing = state
            .sessions
            .values_mut()
            .find(|s| s.user_id == session.user_id && s.device_id == session.device_id);

        if let Some(stored) = existing {
            stored.token_hash = session.token_hash;
            stored.expires_at = session.expires_at;
            stored.last_used_at = now;
            stored.revoked_at = None;
            return Ok(stored.clone());
        }

        let stored = DbRefreshSession {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            device_id: session.device_id,
            token_hash: session.token_hash,
            created_at: now,
            expires_at: session.expires_at,
            last_used_at: now,
            revoked_at: None,
        };
        state.sessions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_refresh_session(
        &self,
        token_hash: &str,
        device_id: &str,
    ) -> DbResult<Option<DbRefreshSession>> {
        Ok(self
            .state
            .lock()
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash && s.device_id == device_id)
            .cloned())
    }

    async fn rotate_refresh_session(&self, rotation: RefreshRotation) -> DbResult<bool> {
        let mut state = self.state.lock();
        match state.sessions.get_mut(&rotation.session_id) {
            Some(stored) if stored.token_hash == rotation.expected_hash && stored.revoked_at.is_none() => {
                stored.token_hash = rotation.new_hash;
                stored.expires_at = rotation.expires_at;
                stored.last_used_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_refresh_session(&self, token_hash: &str) -> DbResult<u64> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let mut affected = 0;
        for session in state.sessions.values_mut() {
            if session.token_hash == token_hash && session.revoked_at.is_none() {
                session.revoked_at = Some(now);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn revoke_refresh_session_for_device(&self, user_id: Uuid, device_id: &str) -> DbResult<u64> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let mut affected = 0;
        for session in state.sessions.values_mut() {
            if session.user_id == user_id && session.device_id == device_id && session.revoked_at.is_none() {
                session.revoked_at = Some(now);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

// ============================================================================
// Session Store
// ============================================================================

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Key-value store with Redis-like TTL semantics.
///
/// `fail_all` switches every call to a `DbError::Redis`, for exercising
/// fail-closed paths.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    failing: Mutex<bool>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries.lock().get(key).is_some_and(|e| e.is_live(now))
    }

    /// Number of unexpired keys
    pub fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    fn check(&self) -> DbResult<()> {
        if *self.failing.lock() {
            return Err(DbError::Redis("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()> {
        self.check()?;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.check()?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn delete(&self, key: &str) -> DbResult<bool> {
        self.check()?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn incr(&self, key: &str) -> DbResult<i64> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let live_value = entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone());

        let current = match live_value {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| DbError::Redis("value is not an integer".to_string()))?,
            None => {
                entries.remove(key);
                0
            }
        };

        let next = current + 1;
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: String::new(),
            expires_at: None,
        });
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> DbResult<bool> {
        self.check()?;
        let now = Instant::now();
        match self.entries.lock().get_mut(key).filter(|e| e.is_live(now)) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> DbResult<()> {
        self.check()
    }
}

// ============================================================================
// Inventory Store
// ============================================================================

struct SoftDeleted<T> {
    row: T,
    deleted: bool,
}

#[derive(Default)]
struct InventoryState {
    categories: HashMap<Uuid, SoftDeleted<DbProductCategory>>,
    products: HashMap<Uuid, SoftDeleted<DbProduct>>,
    warehouses: HashMap<Uuid, SoftDeleted<DbWarehouseLocation>>,
    stocks: HashMap<Uuid, SoftDeleted<DbProductStock>>,
    movements: Vec<DbStockMovement>,
}

/// In-memory inventory. `fail_movements` makes the audit write fail.
#[derive(Default)]
pub struct MemoryInventoryStore {
    state: Mutex<InventoryState>,
    fail_movements: Mutex<bool>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_movements(&self, failing: bool) {
        *self.fail_movements.lock() = failing;
    }

    pub fn movements(&self) -> Vec<DbStockMovement> {
        self.state.lock().movements.clone()
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().products.values().filter(|p| !p.deleted).count()
    }

    pub fn warehouse_count(&self) -> usize {
        self.state.lock().warehouses.values().filter(|w| !w.deleted).count()
    }
}

fn live<T: Clone>(map: &HashMap<Uuid, SoftDeleted<T>>, id: Uuid) -> Option<T> {
    map.get(&id).filter(|r| !r.deleted).map(|r| r.row.clone())
}

fn live_mut<'a, T>(map: &'a mut HashMap<Uuid, SoftDeleted<T>>, id: Uuid, what: &str) -> DbResult<&'a mut T> {
    map.get_mut(&id)
        .filter(|r| !r.deleted)
        .map(|r| &mut r.row)
        .ok_or_else(|| DbError::NotFound(format!("{} {}", what, id)))
}

fn soft_delete<T>(map: &mut HashMap<Uuid, SoftDeleted<T>>, id: Uuid, what: &str) -> DbResult<()> {
    match map.get_mut(&id).filter(|r| !r.deleted) {
        Some(record) => {
            record.deleted = true;
            Ok(())
        }
        None => Err(DbError::NotFound(format!("{} {}", what, id))),
    }
}

/// Filter, sort by creation time and paginate.
fn paginate<T: Clone>(
    rows: impl Iterator<Item = T>,
    params: &ListParams,
    matches: impl Fn(&T, &str) -> bool,
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
) -> Page<T> {
    let needle = params
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut items: Vec<T> = rows
        .filter(|row| needle.as_deref().map_or(true, |n| matches(row, n)))
        .collect();
    items.sort_by_key(|row| created_at(row));
    if params.order == SortOrder::Desc {
        items.reverse();
    }

    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.limit as usize)
        .collect();

    Page { items, total }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn create_category(&self, new: NewProductCategory) -> DbResult<DbProductCategory> {
        let mut state = self.state.lock();
        if state.categories.values().any(|c| c.row.name == new.name) {
            return Err(DbError::Duplicate("product_categories_name_key".to_string()));
        }
        let now = Utc::now();
        let row = DbProductCategory {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(row.id, SoftDeleted { row: row.clone(), deleted: false });
        Ok(row)
    }

    async fn find_category(&self, id: Uuid) -> DbResult<Option<DbProductCategory>> {
        Ok(live(&self.state.lock().categories, id))
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: ProductCategoryChanges,
    ) -> DbResult<DbProductCategory> {
        let mut state = self.state.lock();
        let row = live_mut(&mut state.categories, id, "product category")?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_category(&self, id: Uuid) -> DbResult<()> {
        soft_delete(&mut self.state.lock().categories, id, "product category")
    }

    async fn list_categories(&self, params: &ListParams) -> DbResult<Page<DbProductCategory>> {
        let state = self.state.lock();
        Ok(paginate(
            state.categories.values().filter(|r| !r.deleted).map(|r| r.row.clone()),
            params,
            |c, n| contains_ci(&c.name, n) || contains_ci(&c.description, n),
            |c| c.created_at,
        ))
    }

    async fn create_product(&self, new: NewProduct) -> DbResult<DbProduct> {
        let mut state = self.state.lock();
        if state.products.values().any(|p| p.row.sku == new.sku) {
            return Err(DbError::Duplicate("products_sku_key".to_string()));
        }
        let category_name = live(&state.categories, new.category_id)
            .map(|c| c.name)
            .ok_or_else(|| DbError::Constraint("products_category_id_fkey".to_string()))?;

        let now = Utc::now();
        let row = DbProduct {
            id: Uuid::new_v4(),
            name: new.name,
            sku: new.sku,
            category_id: new.category_id,
            category_name: Some(category_name),
            description: new.description,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(row.id, SoftDeleted { row: row.clone(), deleted: false });
        Ok(row)
    }

    async fn find_product(&self, id: Uuid) -> DbResult<Option<DbProduct>> {
        Ok(live(&self.state.lock().products, id))
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> DbResult<DbProduct> {
        let mut state = self.state.lock();
        let category_name = match changes.category_id {
            Some(category_id) => Some(
                live(&state.categories, category_id)
                    .map(|c| c.name)
                    .ok_or_else(|| DbError::Constraint("products_category_id_fkey".to_string()))?,
            ),
            None => None,
        };

        let row = live_mut(&mut state.products, id, "product")?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(sku) = changes.sku {
            row.sku = sku;
        }
        if let Some(category_id) = changes.category_id {
            row.category_id = category_id;
            row.category_name = category_name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_product(&self, id: Uuid) -> DbResult<()> {
        soft_delete(&mut self.state.lock().products, id, "product")
    }

    async fn list_products(&self, params: &ListParams) -> DbResult<Page<DbProduct>> {
        let state = self.state.lock();
        Ok(paginate(
            state.products.values().filter(|r| !r.deleted).map(|r| r.row.clone()),
            params,
            |p, n| contains_ci(&p.name, n) || contains_ci(&p.sku, n) || contains_ci(&p.description, n),
            |p| p.created_at,
        ))
    }

    async fn create_warehouse(&self, new: NewWarehouseLocation) -> DbResult<DbWarehouseLocation> {
        let now = Utc::now();
        let row = DbWarehouseLocation {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .warehouses
            .insert(row.id, SoftDeleted { row: row.clone(), deleted: false });
        Ok(row)
    }

    async fn find_warehouse(&self, id: Uuid) -> DbResult<Option<DbWarehouseLocation>> {
        Ok(live(&self.state.lock().warehouses, id))
    }

    async fn update_warehouse(
        &self,
        id: Uuid,
        changes: WarehouseLocationChanges,
    ) -> DbResult<DbWarehouseLocation> {
        let mut state = self.state.lock();
        let row = live_mut(&mut state.warehouses, id, "warehouse location")?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_warehouse(&self, id: Uuid) -> DbResult<()> {
        soft_delete(&mut self.state.lock().warehouses, id, "warehouse location")
    }

    async fn list_warehouses(&self, params: &ListParams) -> DbResult<Page<DbWarehouseLocation>> {
        let state = self.state.lock();
        Ok(paginate(
            state.warehouses.values().filter(|r| !r.deleted).map(|r| r.row.clone()),
            params,
            |w, n| contains_ci(&w.name, n) || contains_ci(&w.description, n),
            |w| w.created_at,
        ))
    }

    async fn create_stock(&self, new: NewProductStock) -> DbResult<DbProductStock> {
        let mut state = self.state.lock();
        let product = live(&state.products, new.product_id)
            .ok_or_else(|| DbError::Constraint("product_stocks_product_id_fkey".to_string()))?;
        let warehouse = live(&state.warehouses, new.warehouse_location_id).ok_or_else(|| {
            DbError::Constraint("product_stocks_warehouse_location_id_fkey".to_string())
        })?;

        let now = Utc::now();
        let row = DbProductStock {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_name: Some(product.name),
            warehouse_location_id: warehouse.id,
            warehouse_name: Some(warehouse.name),
            quantity: new.quantity,
            status: StockStatus::for_quantity(new.quantity).as_str().to_string(),
            updated_by: new.updated_by,
            created_at: now,
            updated_at: now,
        };
        state.stocks.insert(row.id, SoftDeleted { row: row.clone(), deleted: false });
        Ok(row)
    }

    async fn find_stock(&self, id: Uuid) -> DbResult<Option<DbProductStock>> {
        Ok(live(&self.state.lock().stocks, id))
    }

    async fn update_stock(&self, id: Uuid, changes: ProductStockChanges) -> DbResult<DbProductStock> {
        let mut state = self.state.lock();
        let row = live_mut(&mut state.stocks, id, "product stock")?;
        row.quantity = changes.quantity;
        row.status = StockStatus::for_quantity(changes.quantity).as_str().to_string();
        row.updated_by = changes.updated_by;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_stock(&self, id: Uuid) -> DbResult<()> {
        soft_delete(&mut self.state.lock().stocks, id, "product stock")
    }

    async fn list_stocks(&self, params: &ListParams) -> DbResult<Page<DbProductStock>> {
        let state = self.state.lock();
        Ok(paginate(
            state.stocks.values().filter(|r| !r.deleted).map(|r| r.row.clone()),
            params,
            |s, n| {
                s.product_name.as_deref().is_some_and(|p| contains_ci(p, n))
                    || s.warehouse_name.as_deref().is_some_and(|w| contains_ci(w, n))
            },
            |s| s.created_at,
        ))
    }

    async fn record_movement(&self, movement: NewStockMovement) -> DbResult<DbStockMovement> {
        if *self.fail_movements.lock() {
            return Err(DbError::Connection("movement log unavailable".to_string()));
        }
        let row = DbStockMovement {
            id: Uuid::new_v4(),
            product_id: movement.product_id,
            movement_type: movement.movement_type.as_str().to_string(),
            quantity: movement.quantity,
            reference_note: movement.reference_note,
            created_by: movement.created_by,
            created_at: Utc::now(),
        };
        self.state.lock().movements.push(row.clone());
        Ok(row)
    }
}
