//! Database models - mapped from PostgreSQL tables

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub status: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DbUser {
    pub fn is_active(&self) -> bool {
        self.status == user_status::ACTIVE && self.deleted_at.is_none()
    }
}

/// Values of the `users.status` column
pub mod user_status {
    pub const ACTIVE: &str = "active";
    pub const INACTIVE: &str = "inactive";
    pub const BANNED: &str = "banned";
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential record. Debug output never includes the hash.
#[derive(Clone, FromRow)]
pub struct DbUserSecurity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for DbUserSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbUserSecurity")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("password_hash", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything created by a signup, written in one transaction.
#[derive(Clone)]
pub struct NewUserBundle {
    pub email: String,
    pub status: String,
    pub email_verified: bool,
    pub full_name: String,
    pub password_hash: String,
    pub role: String,
}

impl fmt::Debug for NewUserBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserBundle")
            .field("email", &self.email)
            .field("status", &self.status)
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Refresh Sessions
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbRefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl DbRefreshSession {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub user_id: Uuid,
    pub device_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Compare-and-swap of a refresh session's token hash.
#[derive(Debug, Clone)]
pub struct RefreshRotation {
    pub session_id: Uuid,
    pub expected_hash: String,
    pub new_hash: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Inventory Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProductCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProduct {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWarehouseLocation {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProductStock {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub warehouse_location_id: Uuid,
    pub warehouse_name: Option<String>,
    pub quantity: i32,
    pub status: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbStockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub reference_note: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Stock availability derived from on-hand quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    Available,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub const LOW_STOCK_THRESHOLD: i32 = 10;

    pub fn for_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity < Self::LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::Available
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::LowStock => "low-stock",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Inbound,
    Outbound,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProductCategory {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductCategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category_id: Uuid,
    pub description: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWarehouseLocation {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct WarehouseLocationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProductStock {
    pub product_id: Uuid,
    pub warehouse_location_id: Uuid,
    pub quantity: i32,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ProductStockChanges {
    pub quantity: i32,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reference_note: String,
    pub created_by: Option<Uuid>,
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Page, filter and sort parameters for list queries
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            sort_by: None,
            order: SortOrder::Asc,
        }
    }
}

impl ListParams {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Search term wrapped for `ILIKE`, if any
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

/// One page of a list query plus the unpaged total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(StockStatus::for_quantity(-3), StockStatus::OutOfStock);
        assert_eq!(StockStatus::for_quantity(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::for_quantity(1), StockStatus::LowStock);
        assert_eq!(StockStatus::for_quantity(9), StockStatus::LowStock);
        assert_eq!(StockStatus::for_quantity(10), StockStatus::Available);
        assert_eq!(StockStatus::for_quantity(10).as_str(), "available");
    }

    #[test]
    fn test_list_params_offset() {
        let params = ListParams { page: 3, limit: 20, ..Default::default() };
        assert_eq!(params.offset(), 40);

        let first = ListParams { page: 0, ..Default::default() };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_search_pattern_ignores_blank() {
        let params = ListParams { search: Some("   ".into()), ..Default::default() };
        assert_eq!(params.search_pattern(), None);

        let params = ListParams { search: Some("bolt".into()), ..Default::default() };
        assert_eq!(params.search_pattern().as_deref(), Some("%bolt%"));
    }

    #[test]
    fn test_security_debug_redacts_hash() {
        let sec = DbUserSecurity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            password_hash: "$argon2id$v=19$secret".into(),
            updated_at: Utc::now(),
        };
        let out = format!("{:?}", sec);
        assert!(!out.contains("argon2id"));
        assert!(out.contains("REDACTED"));
    }
}
