//! # Material Repository
//!
//! Database operations for raw materials (ingredients and packaging).
//!
//! ## Key Operations
//! - CRUD for the administration workflow
//! - Replenishment bookkeeping (`receive_purchase`)
//! - Stock adjustments (manual counts; sale-time decrements go through
//!   the consumption recorder's transaction instead)
//! - Low-stock listing for reorder reports
//!
//! ## Stock Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: Absolute update (races with concurrent sales)           │
//! │     UPDATE materials SET stock_quantity = 7 WHERE id = ?           │
//! │                                                                     │
//! │  ✅ CORRECT: Delta update                                          │
//! │     UPDATE materials SET stock_quantity = stock_quantity - 3       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mise_core::Material;

/// Column list shared by every SELECT that maps to [`Material`].
const MATERIAL_COLUMNS: &str = "id, name, category, supplier_id, purchase_unit, \
     purchase_quantity, purchase_cost, stock_quantity, low_stock_threshold, \
     is_active, created_at, updated_at";

/// Repository for material database operations.
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    /// Creates a new MaterialRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    /// Gets a material by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1");
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(material)
    }

    /// Lists active materials, sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Material>> {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE is_active = 1 ORDER BY name"
        );
        let materials = sqlx::query_as::<_, Material>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(materials)
    }

    /// Inserts a new material.
    pub async fn insert(&self, material: &Material) -> DbResult<()> {
        debug!(id = %material.id, name = %material.name, "Inserting material");

        mise_core::validation::validate_uuid(&material.id)
            .map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_name(&material.name)
            .map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_purchase_quantity(material.purchase_quantity)
            .map_err(mise_core::EngineError::from)?;
        mise_core::validation::validate_money("purchase_cost", material.purchase_cost)
            .map_err(mise_core::EngineError::from)?;

        sqlx::query(
            r#"
            INSERT INTO materials (
                id, name, category, supplier_id, purchase_unit,
                purchase_quantity, purchase_cost, stock_quantity,
                low_stock_threshold, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(&material.category)
        .bind(&material.supplier_id)
        .bind(&material.purchase_unit)
        .bind(material.purchase_quantity)
        .bind(material.purchase_cost)
        .bind(material.stock_quantity)
        .bind(material.low_stock_threshold)
        .bind(material.is_active)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing material's descriptive and purchase fields.
    ///
    /// Stock is deliberately not written here; use [`Self::adjust_stock`]
    /// or [`Self::receive_purchase`] so concurrent decrements aren't lost.
    pub async fn update(&self, material: &Material) -> DbResult<()> {
        debug!(id = %material.id, "Updating material");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE materials SET
                name = ?2,
                category = ?3,
                supplier_id = ?4,
                purchase_unit = ?5,
                purchase_quantity = ?6,
                purchase_cost = ?7,
                low_stock_threshold = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(&material.category)
        .bind(&material.supplier_id)
        .bind(&material.purchase_unit)
        .bind(material.purchase_quantity)
        .bind(material.purchase_cost)
        .bind(material.low_stock_threshold)
        .bind(material.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", &material.id));
        }

        Ok(())
    }

    /// Records receipt of purchased batches: stock increases by
    /// `batches × purchase_quantity` base units.
    ///
    /// ## Example
    /// A material bought as 1kg bags (`purchase_quantity = 1000` grams):
    /// `receive_purchase(id, 3.0)` adds 3000 grams of stock.
    pub async fn receive_purchase(&self, id: &str, batches: f64) -> DbResult<()> {
        debug!(id = %id, batches = %batches, "Receiving purchase");

        mise_core::validation::validate_quantity(batches).map_err(mise_core::EngineError::from)?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE materials
            SET
                stock_quantity = stock_quantity + purchase_quantity * ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(batches)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }

    /// Adjusts stock by a delta in base units (negative for shrinkage,
    /// positive for a correcting count).
    pub async fn adjust_stock(&self, id: &str, delta: f64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE materials
            SET
                stock_quantity = stock_quantity + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }

    /// Lists active materials at or below their low-stock threshold,
    /// lowest relative stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Material>> {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials \
             WHERE is_active = 1 AND stock_quantity <= low_stock_threshold \
             ORDER BY stock_quantity - low_stock_threshold"
        );
        let materials = sqlx::query_as::<_, Material>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(materials)
    }

    /// Soft-deletes a material by setting is_active = false.
    ///
    /// Historical consumption records still reference it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting material");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE materials SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }

    /// Counts active materials (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM materials WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Helper to generate a new material ID.
pub fn generate_material_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
