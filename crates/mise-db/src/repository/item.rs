//! # Sellable Item Repository
//!
//! Database operations for catalog items (simple products and combos).
//!
//! ## Cached Unit Cost
//! `items.unit_cost` is a denormalized copy of the last cost rollup over
//! the item's base recipe context. It exists so menu and margin screens
//! never pay for a graph traversal. The propagation service refreshes it
//! leaves-first whenever a material price or a recipe changes; everything
//! else treats the column as read-only.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mise_core::SellableItem;

/// Column list shared by every SELECT that maps to [`SellableItem`].
const ITEM_COLUMNS: &str = "id, external_id, name, sku, category, base_price, \
     unit_cost, combo_price_override, manage_stock, stock_quantity, \
     is_active, created_at, updated_at";

/// Repository for sellable-item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SellableItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let item = sqlx::query_as::<_, SellableItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item by the external platform's product identifier.
    ///
    /// Order webhooks identify products by this id, not by our UUID.
    pub async fn get_by_external_id(&self, external_id: &str) -> DbResult<Option<SellableItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE external_id = ?1");
        let item = sqlx::query_as::<_, SellableItem>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists active items, sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<SellableItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE is_active = 1 ORDER BY name");
        let items = sqlx::query_as::<_, SellableItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Inserts a new item.
    pub async fn insert(&self, item: &SellableItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting item");

        mise_core::validation::validate_uuid(&item.id).map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_name(&item.name).map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_external_id("external_id", &item.external_id)
            .map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_money("base_price", item.base_price)
            .map_err(mise_core::EngineError::from)?;

        sqlx::query(
            r#"
            INSERT INTO items (
                id, external_id, name, sku, category, base_price,
                unit_cost, combo_price_override, manage_stock,
                stock_quantity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&item.id)
        .bind(&item.external_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category)
        .bind(item.base_price)
        .bind(item.unit_cost)
        .bind(item.combo_price_override)
        .bind(item.manage_stock)
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing item's catalog fields.
    ///
    /// `unit_cost` is excluded; the propagation service owns that column
    /// via [`Self::update_unit_cost`].
    pub async fn update(&self, item: &SellableItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                external_id = ?2,
                name = ?3,
                sku = ?4,
                category = ?5,
                base_price = ?6,
                combo_price_override = ?7,
                manage_stock = ?8,
                stock_quantity = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.external_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category)
        .bind(item.base_price)
        .bind(item.combo_price_override)
        .bind(item.manage_stock)
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Writes the cached unit cost after a rollup refresh.
    pub async fn update_unit_cost(&self, id: &str, unit_cost: f64) -> DbResult<()> {
        debug!(id = %id, unit_cost = %unit_cost, "Refreshing cached unit cost");

        let now = Utc::now();

        let result = sqlx::query("UPDATE items SET unit_cost = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(unit_cost)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Soft-deletes an item by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting item");

        let now = Utc::now();

        let result = sqlx::query("UPDATE items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Counts active items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
