//! # Consumption Repository
//!
//! Read side of the consumption ledger: per-order and per-line COGS
//! reporting over `consumption_records`.
//!
//! ## Write Path
//! Records are only ever written by the engine's sale recorder, inside
//! the same transaction that decrements material stock (see
//! `crate::engine::CogsEngine::record_sale`). This repository reads and,
//! for explicit historical resets, bulk-deletes.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use mise_core::ConsumptionRecord;

const RECORD_COLUMNS: &str =
    "id, order_id, order_line_id, material_id, quantity, cost, created_at";

/// Repository for consumption-record queries.
#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
}

impl ConsumptionRepository {
    /// Creates a new ConsumptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionRepository { pool }
    }

    /// Lists every record for an order, in insertion order.
    pub async fn list_by_order(&self, order_id: &str) -> DbResult<Vec<ConsumptionRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM consumption_records \
             WHERE order_id = ?1 ORDER BY created_at, id"
        );
        let records = sqlx::query_as::<_, ConsumptionRecord>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Lists every record for one order line.
    pub async fn list_by_order_line(
        &self,
        order_line_id: &str,
    ) -> DbResult<Vec<ConsumptionRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM consumption_records \
             WHERE order_line_id = ?1 ORDER BY created_at, id"
        );
        let records = sqlx::query_as::<_, ConsumptionRecord>(&sql)
            .bind(order_line_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Total recorded cost of goods for an order.
    pub async fn order_cogs(&self, order_id: &str) -> DbResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cost), 0.0) FROM consumption_records WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Total recorded cost of goods for one order line.
    pub async fn order_line_cogs(&self, order_line_id: &str) -> DbResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cost), 0.0) FROM consumption_records WHERE order_line_id = ?1",
        )
        .bind(order_line_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Deletes the entire consumption history.
    ///
    /// For explicit administrative resets (e.g. after a stocktake
    /// re-baseline). Stock levels are not touched.
    pub async fn reset_history(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM consumption_records")
            .execute(&self.pool)
            .await?;

        info!(deleted = result.rows_affected(), "Consumption history reset");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
