//! # COGS Engine Service
//!
//! The database-backed surface of the recipe & COGS engine. Each call
//! loads a consistent [`Catalog`] snapshot, runs the pure traversal from
//! `mise-core`, and (for the one writer) applies the result transactionally.
//!
//! ## Call Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CogsEngine                                      │
//! │                                                                         │
//! │  flatten_choices(item)          read-only   rooted snapshot            │
//! │  calculate_cost(item, qty, sel) read-only   rooted snapshot            │
//! │  record_sale(...)               WRITER      rooted snapshot + one tx   │
//! │  on_material_price_change(mat)  WRITER      full snapshot, leaves-     │
//! │                                             first cached-cost refresh  │
//! │  refresh_item_cost(item)        WRITER      rooted snapshot, one item  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Transaction
//! `record_sale` is the only path that mutates stock. All of one sale
//! line's stock decrements and audit-record inserts commit together or
//! not at all; a crash mid-sale never leaves stock drawn without a
//! matching record.
//!
//! ## Oversell Policy
//! Stock may go negative. A busy counter must never refuse a sale the
//! cashier already made because the on-paper count disagrees with the
//! shelf; the negative balance plus an [`EngineWarning::Oversold`] warning
//! is the signal to recount, not a reason to block checkout.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{ItemRepository, RecipeRepository};
use mise_core::{
    affected_items, calculate_cost, flatten_choices, plan_consumption, BundleSelection,
    ConsumptionRecord, CostResult, EngineWarning, FlattenedChoices,
};

// =============================================================================
// Result Types
// =============================================================================

/// Outcome of [`CogsEngine::record_sale`]: the persisted audit rows plus
/// any warnings raised while planning or applying the draws.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordedSale {
    /// One audit row per planned draw, in traversal order.
    pub records: Vec<ConsumptionRecord>,

    /// Planning warnings (missing references, unresolved groups) plus an
    /// [`EngineWarning::Oversold`] per material whose stock went negative.
    pub warnings: Vec<EngineWarning>,
}

impl RecordedSale {
    /// Total cost of goods recorded for this sale line.
    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.cost).sum()
    }
}

/// One refreshed cached cost from a propagation pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RefreshedCost {
    pub item_id: String,
    pub unit_cost: f64,
}

// =============================================================================
// Engine
// =============================================================================

/// Database-backed recipe & COGS engine service.
#[derive(Debug, Clone)]
pub struct CogsEngine {
    pool: SqlitePool,
}

impl CogsEngine {
    /// Creates a new engine over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CogsEngine { pool }
    }

    fn recipes(&self) -> RecipeRepository {
        RecipeRepository::new(self.pool.clone())
    }

    fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    /// Flattens every buyer choice of an item's recipe tree to one level.
    ///
    /// Errors with [`mise_core::EngineError::ItemNotFound`] (as
    /// [`DbError::Engine`]) when the root item does not exist.
    pub async fn flatten_choices(&self, item_id: &str) -> DbResult<FlattenedChoices> {
        let catalog = self.recipes().load_catalog(item_id).await?;
        Ok(flatten_choices(&catalog, item_id)?)
    }

    /// Calculates the cost of `quantity` units of an item under the given
    /// selection.
    ///
    /// Never errors on catalog content: an unknown item comes back as
    /// zero-cost with `no_recipe = true`, and a recipe-less primitive is
    /// charged at its cached unit cost.
    pub async fn calculate_cost(
        &self,
        item_id: &str,
        quantity: f64,
        selection: Option<&BundleSelection>,
    ) -> DbResult<CostResult> {
        mise_core::validation::validate_quantity(quantity)
            .map_err(mise_core::EngineError::from)?;

        let catalog = self.recipes().load_catalog(item_id).await?;
        Ok(calculate_cost(&catalog, item_id, quantity, selection))
    }

    /// Records a confirmed sale line: plans the material draws, then in
    /// ONE transaction decrements stock and inserts one audit record per
    /// draw.
    ///
    /// Errors with [`mise_core::EngineError::ItemNotFound`] when the sold
    /// item does not exist; a sale of something the catalog has never
    /// heard of is an integration fault, not a degradable quote.
    pub async fn record_sale(
        &self,
        order_id: &str,
        order_line_id: &str,
        item_id: &str,
        quantity: f64,
        selection: Option<&BundleSelection>,
    ) -> DbResult<RecordedSale> {
        mise_core::validation::validate_quantity(quantity)
            .map_err(mise_core::EngineError::from)?;

        let catalog = self.recipes().load_catalog(item_id).await?;
        let plan = plan_consumption(&catalog, item_id, quantity, selection)?;

        debug!(
            order_id = %order_id,
            order_line_id = %order_line_id,
            item_id = %item_id,
            draws = plan.entries.len(),
            "Applying consumption plan"
        );

        let mut warnings = plan.warnings.clone();
        let mut records = Vec::with_capacity(plan.entries.len());
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for draw in &plan.entries {
            let stock_after: Option<f64> = sqlx::query_scalar(
                r#"
                UPDATE materials
                SET stock_quantity = stock_quantity - ?2, updated_at = ?3
                WHERE id = ?1
                RETURNING stock_quantity
                "#,
            )
            .bind(&draw.material_id)
            .bind(draw.quantity)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(stock_after) = stock_after else {
                // The plan was built from a snapshot containing this
                // material; it disappearing mid-sale aborts the tx.
                return Err(DbError::not_found("Material", &draw.material_id));
            };

            if stock_after < 0.0 {
                warn!(
                    material_id = %draw.material_id,
                    material = %draw.material_name,
                    stock_after = %stock_after,
                    "Material oversold"
                );
                warnings.push(EngineWarning::Oversold {
                    material_id: draw.material_id.clone(),
                    stock_after,
                });
            }

            let record = ConsumptionRecord {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                order_line_id: order_line_id.to_string(),
                material_id: draw.material_id.clone(),
                quantity: draw.quantity,
                cost: draw.cost,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO consumption_records
                    (id, order_id, order_line_id, material_id, quantity, cost, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&record.id)
            .bind(&record.order_id)
            .bind(&record.order_line_id)
            .bind(&record.material_id)
            .bind(record.quantity)
            .bind(record.cost)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await?;

            records.push(record);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order_id,
            order_line_id = %order_line_id,
            records = records.len(),
            "Sale recorded"
        );

        Ok(RecordedSale { records, warnings })
    }

    /// Refreshes cached unit costs after a material's purchase economics
    /// changed.
    ///
    /// Loads the full catalog, orders every item whose recipe tree reaches
    /// the material leaves-first, recomputes each over the base recipe
    /// context (empty selection, quantity 1) and persists the new cached
    /// cost. Returns the refreshed items in update order.
    pub async fn on_material_price_change(
        &self,
        material_id: &str,
    ) -> DbResult<Vec<RefreshedCost>> {
        let mut catalog = self.recipes().load_full_catalog().await?;
        if catalog.material(material_id).is_none() {
            return Err(DbError::Engine(mise_core::EngineError::MaterialNotFound(
                material_id.to_string(),
            )));
        }
        let order = affected_items(&catalog, material_id);

        info!(
            material_id = %material_id,
            affected = order.len(),
            "Propagating material price change"
        );

        let items = self.items();
        let mut refreshed = Vec::with_capacity(order.len());

        for item_id in order {
            let cost = calculate_cost(&catalog, &item_id, 1.0, None);
            // Keep the snapshot current so ancestors computed later see
            // the refreshed child through any cached-cost charge.
            catalog.set_item_unit_cost(&item_id, cost.total_cost);
            items.update_unit_cost(&item_id, cost.total_cost).await?;

            refreshed.push(RefreshedCost {
                item_id,
                unit_cost: cost.total_cost,
            });
        }

        Ok(refreshed)
    }

    /// Recomputes and persists one item's cached unit cost, e.g. after
    /// its recipe was edited.
    ///
    /// A recipe-less primitive is left untouched: its cached cost is
    /// authored data, not a rollup, so there is nothing to derive it from.
    ///
    /// Returns the full rollup so callers can also inspect the breakdown
    /// and warnings.
    pub async fn refresh_item_cost(&self, item_id: &str) -> DbResult<CostResult> {
        let catalog = self.recipes().load_catalog(item_id).await?;
        if catalog.item(item_id).is_none() {
            return Err(DbError::Engine(mise_core::EngineError::ItemNotFound(
                item_id.to_string(),
            )));
        }

        let cost = calculate_cost(&catalog, item_id, 1.0, None);
        if catalog.lines_for(item_id).is_empty() {
            return Ok(cost);
        }
        self.items().update_unit_cost(item_id, cost.total_cost).await?;

        debug!(item_id = %item_id, unit_cost = %cost.total_cost, "Cached cost refreshed");
        Ok(cost)
    }
}
