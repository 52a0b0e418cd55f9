//! Inventory repository: categories, products, warehouse locations, stock

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::InventoryStore;
use crate::*;

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.sku, p.category_id, c.name AS category_name, p.description,
           p.created_by, p.created_at, p.updated_at
    FROM products p
    LEFT JOIN product_categories c ON c.id = p.category_id
"#;

const WAREHOUSE_COLUMNS: &str = "id, name, description, created_at, updated_at";

const STOCK_SELECT: &str = r#"
    SELECT s.id, s.product_id, p.name AS product_name, s.warehouse_location_id,
           w.name AS warehouse_name, s.quantity, s.status, s.updated_by,
           s.created_at, s.updated_at
    FROM product_stocks s
    LEFT JOIN products p ON p.id = s.product_id
    LEFT JOIN warehouse_locations w ON w.id = s.warehouse_location_id
"#;

/// Resolve a caller-supplied sort key against a fixed column whitelist.
/// Unknown keys fall back to `created_at`.
fn sort_column(requested: Option<&str>, allowed: &[(&str, &'static str)]) -> &'static str {
    requested
        .and_then(|key| allowed.iter().find(|(name, _)| *name == key))
        .map(|(_, column)| *column)
        .unwrap_or(allowed[0].1)
}

#[derive(Clone)]
pub struct InventoryRepo {
    pool: PgPool,
}

impl InventoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn soft_delete(&self, table: &str, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE {table} SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InventoryRepo {
    // =========================================================================
    // Categories
    // =========================================================================

    async fn create_category(&self, new: NewProductCategory) -> DbResult<DbProductCategory> {
        let category = sqlx::query_as::<_, DbProductCategory>(&format!(
            "INSERT INTO product_categories (name, description) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(category)
    }

    async fn find_category(&self, id: Uuid) -> DbResult<Option<DbProductCategory>> {
        let category = sqlx::query_as::<_, DbProductCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM product_categories WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: ProductCategoryChanges,
    ) -> DbResult<DbProductCategory> {
        let category = sqlx::query_as::<_, DbProductCategory>(&format!(
            r#"
            UPDATE product_categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        category.ok_or_else(|| DbError::NotFound(format!("product category {}", id)))
    }

    async fn delete_category(&self, id: Uuid) -> DbResult<()> {
        self.soft_delete("product_categories", id).await
    }

    async fn list_categories(&self, params: &ListParams) -> DbResult<Page<DbProductCategory>> {
        let pattern = params.search_pattern();
        let filter = "deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM product_categories WHERE {filter}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let column = sort_column(
            params.sort_by.as_deref(),
            &[("created_at", "created_at"), ("name", "name"), ("updated_at", "updated_at")],
        );
        let items = sqlx::query_as::<_, DbProductCategory>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM product_categories WHERE {filter} ORDER BY {column} {} LIMIT $2 OFFSET $3",
            params.order.as_sql()
        ))
        .bind(&pattern)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    // =========================================================================
    // Products
    // =========================================================================

    async fn create_product(&self, new: NewProduct) -> DbResult<DbProduct> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, sku, category_id, description, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.sku)
        .bind(new.category_id)
        .bind(&new.description)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        self.find_product(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("product {}", id)))
    }

    async fn find_product(&self, id: Uuid) -> DbResult<Option<DbProduct>> {
        let product = sqlx::query_as::<_, DbProduct>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = $1 AND p.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> DbResult<DbProduct> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                category_id = COALESCE($4, category_id),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.sku)
        .bind(changes.category_id)
        .bind(changes.description)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("product {}", id)));
        }

        self.find_product(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("product {}", id)))
    }

    async fn delete_product(&self, id: Uuid) -> DbResult<()> {
        self.soft_delete("products", id).await
    }

    async fn list_products(&self, params: &ListParams) -> DbResult<Page<DbProduct>> {
        let pattern = params.search_pattern();
        let filter = "p.deleted_at IS NULL AND ($1::text IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1 OR p.description ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p WHERE {filter}"))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let column = sort_column(
            params.sort_by.as_deref(),
            &[
                ("created_at", "p.created_at"),
                ("name", "p.name"),
                ("sku", "p.sku"),
                ("updated_at", "p.updated_at"),
            ],
        );
        let items = sqlx::query_as::<_, DbProduct>(&format!(
            "{PRODUCT_SELECT} WHERE {filter} ORDER BY {column} {} LIMIT $2 OFFSET $3",
            params.order.as_sql()
        ))
        .bind(&pattern)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    // =========================================================================
    // Warehouse Locations
    // =========================================================================

    async fn create_warehouse(&self, new: NewWarehouseLocation) -> DbResult<DbWarehouseLocation> {
        let location = sqlx::query_as::<_, DbWarehouseLocation>(&format!(
            "INSERT INTO warehouse_locations (name, description) VALUES ($1, $2) RETURNING {WAREHOUSE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(location)
    }

    async fn find_warehouse(&self, id: Uuid) -> DbResult<Option<DbWarehouseLocation>> {
        let location = sqlx::query_as::<_, DbWarehouseLocation>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouse_locations WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    async fn update_warehouse(
        &self,
        id: Uuid,
        changes: WarehouseLocationChanges,
    ) -> DbResult<DbWarehouseLocation> {
        let location = sqlx::query_as::<_, DbWarehouseLocation>(&format!(
            r#"
            UPDATE warehouse_locations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {WAREHOUSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        location.ok_or_else(|| DbError::NotFound(format!("warehouse location {}", id)))
    }

    async fn delete_warehouse(&self, id: Uuid) -> DbResult<()> {
        self.soft_delete("warehouse_locations", id).await
    }

    async fn list_warehouses(&self, params: &ListParams) -> DbResult<Page<DbWarehouseLocation>> {
        let pattern = params.search_pattern();
        let filter = "deleted_at IS NULL AND ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM warehouse_locations WHERE {filter}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let column = sort_column(
            params.sort_by.as_deref(),
            &[("created_at", "created_at"), ("name", "name"), ("updated_at", "updated_at")],
        );
        let items = sqlx::query_as::<_, DbWarehouseLocation>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouse_locations WHERE {filter} ORDER BY {column} {} LIMIT $2 OFFSET $3",
            params.order.as_sql()
        ))
        .bind(&pattern)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    // =========================================================================
    // Stock Levels
    // =========================================================================

    async fn create_stock(&self, new: NewProductStock) -> DbResult<DbProductStock> {
        let status = StockStatus::for_quantity(new.quantity);
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO product_stocks (product_id, warehouse_location_id, quantity, status, updated_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.product_id)
        .bind(new.warehouse_location_id)
        .bind(new.quantity)
        .bind(status.as_str())
        .bind(new.updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        self.find_stock(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("product stock {}", id)))
    }

    async fn find_stock(&self, id: Uuid) -> DbResult<Option<DbProductStock>> {
        let stock = sqlx::query_as::<_, DbProductStock>(&format!(
            "{STOCK_SELECT} WHERE s.id = $1 AND s.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    async fn update_stock(&self, id: Uuid, changes: ProductStockChanges) -> DbResult<DbProductStock> {
        let status = StockStatus::for_quantity(changes.quantity);
        let result = sqlx::query(
            r#"
            UPDATE product_stocks
            SET quantity = $2, status = $3, updated_by = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(changes.quantity)
        .bind(status.as_str())
        .bind(changes.updated_by)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("product stock {}", id)));
        }

        self.find_stock(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("product stock {}", id)))
    }

    async fn delete_stock(&self, id: Uuid) -> DbResult<()> {
        self.soft_delete("product_stocks", id).await
    }

    async fn list_stocks(&self, params: &ListParams) -> DbResult<Page<DbProductStock>> {
        let pattern = params.search_pattern();
        let filter = "s.deleted_at IS NULL AND ($1::text IS NULL OR p.name ILIKE $1 OR w.name ILIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM product_stocks s
            LEFT JOIN products p ON p.id = s.product_id
            LEFT JOIN warehouse_locations w ON w.id = s.warehouse_location_id
            WHERE {filter}
            "#
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let column = sort_column(
            params.sort_by.as_deref(),
            &[
                ("created_at", "s.created_at"),
                ("quantity", "s.quantity"),
                ("status", "s.status"),
                ("updated_at", "s.updated_at"),
            ],
        );
        let items = sqlx::query_as::<_, DbProductStock>(&format!(
            "{STOCK_SELECT} WHERE {filter} ORDER BY {column} {} LIMIT $2 OFFSET $3",
            params.order.as_sql()
        ))
        .bind(&pattern)
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page { items, total })
    }

    async fn record_movement(&self, movement: NewStockMovement) -> DbResult<DbStockMovement> {
        let recorded = sqlx::query_as::<_, DbStockMovement>(
            r#"
            INSERT INTO stock_movements (product_id, movement_type, quantity, reference_note, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, movement_type, quantity, reference_note, created_by, created_at
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(&movement.reference_note)
        .bind(movement.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(recorded)
    }
}
