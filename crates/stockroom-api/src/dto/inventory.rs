//! Inventory DTOs
//!
//! Products, categories, warehouse locations and stock levels. Update
//! requests carry only the fields to change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_db::models::*;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// Product Categories
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<CreateCategoryRequest> for NewProductCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<UpdateCategoryRequest> for ProductCategoryChanges {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProductCategory> for CategoryResponse {
    fn from(row: DbProductCategory) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    pub sku: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64, message = "SKU must not be empty"))]
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new(self, created_by: Uuid) -> NewProduct {
        NewProduct {
            name: self.name,
            sku: self.sku,
            category_id: self.category_id,
            description: self.description,
            created_by: Some(created_by),
        }
    }
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            sku: req.sku,
            category_id: req.category_id,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProduct> for ProductResponse {
    fn from(row: DbProduct) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category_id: row.category_id,
            category_name: row.category_name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Warehouse Locations
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateWarehouseRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<CreateWarehouseRequest> for NewWarehouseLocation {
    fn from(req: CreateWarehouseRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<UpdateWarehouseRequest> for WarehouseLocationChanges {
    fn from(req: UpdateWarehouseRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbWarehouseLocation> for WarehouseResponse {
    fn from(row: DbWarehouseLocation) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Product Stocks
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateStockRequest {
    pub product_id: Uuid,
    pub warehouse_location_id: Uuid,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
}

impl CreateStockRequest {
    pub fn into_new(self, updated_by: Uuid) -> NewProductStock {
        NewProductStock {
            product_id: self.product_id,
            warehouse_location_id: self.warehouse_location_id,
            quantity: self.quantity,
            updated_by: Some(updated_by),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub warehouse_location_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_name: Option<String>,
    pub quantity: i32,
    /// `available`, `low-stock` or `out-of-stock`
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProductStock> for StockResponse {
    fn from(row: DbProductStock) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            warehouse_location_id: row.warehouse_location_id,
            warehouse_name: row.warehouse_name,
            quantity: row.quantity,
            status: row.status,
            updated_at: row.updated_at,
        }
    }
}
