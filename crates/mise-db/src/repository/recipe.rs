//! # Recipe Repository
//!
//! Database operations for recipe lines and catalog snapshot loading.
//!
//! ## Snapshot Loading
//! Every engine call works over an in-memory [`Catalog`] so one request
//! sees one consistent view of the graph. Two loaders exist:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load_catalog(root)      ─ bounded BFS from one item; pulls only the   │
//! │                            reachable subgraph (request-scoped calls)   │
//! │  load_full_catalog()     ─ everything; used by price propagation,      │
//! │                            which needs reverse edges from a material   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Row Mapping
//! The table stores the reference as (item_type, material_id, linked_item_id)
//! with a CHECK that exactly one id column is set. [`RecipeLineRow`] carries
//! that loose shape out of sqlx; conversion into the typed
//! [`mise_core::RecipeRef`] enforces the invariant again in Rust and reports
//! a corrupt row instead of panicking.

use std::collections::{HashSet, VecDeque};

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use mise_core::{Catalog, Material, RecipeLine, RecipeRef, SellableItem};

const LINE_COLUMNS: &str = "id, owner_item_id, item_type, material_id, linked_item_id, \
     quantity, unit, is_optional, selection_group, sort_order";

const MATERIAL_COLUMNS: &str = "id, name, category, supplier_id, purchase_unit, \
     purchase_quantity, purchase_cost, stock_quantity, low_stock_threshold, \
     is_active, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, external_id, name, sku, category, base_price, \
     unit_cost, combo_price_override, manage_stock, stock_quantity, \
     is_active, created_at, updated_at";

// =============================================================================
// Row Type
// =============================================================================

/// Raw recipe_lines row, before the reference columns are folded into a
/// [`RecipeRef`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeLineRow {
    pub id: String,
    pub owner_item_id: String,
    pub item_type: String,
    pub material_id: Option<String>,
    pub linked_item_id: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub is_optional: bool,
    pub selection_group: Option<String>,
    pub sort_order: i64,
}

impl TryFrom<RecipeLineRow> for RecipeLine {
    type Error = DbError;

    fn try_from(row: RecipeLineRow) -> Result<Self, Self::Error> {
        let reference = match (row.item_type.as_str(), row.material_id, row.linked_item_id) {
            ("material", Some(material_id), None) => RecipeRef::Material(material_id),
            ("linked_item", None, Some(item_id)) => RecipeRef::LinkedItem(item_id),
            (item_type, material_id, linked_item_id) => {
                return Err(DbError::CorruptRecipeLine {
                    line_id: row.id,
                    reason: format!(
                        "item_type '{item_type}' with material_id={material_id:?}, \
                         linked_item_id={linked_item_id:?}"
                    ),
                });
            }
        };

        Ok(RecipeLine {
            id: row.id,
            owner_item_id: row.owner_item_id,
            reference,
            quantity: row.quantity,
            unit: row.unit,
            is_optional: row.is_optional,
            selection_group: row.selection_group,
            sort_order: row.sort_order,
        })
    }
}

fn reference_columns(line: &RecipeLine) -> (&'static str, Option<&str>, Option<&str>) {
    match &line.reference {
        RecipeRef::Material(id) => ("material", Some(id.as_str()), None),
        RecipeRef::LinkedItem(id) => ("linked_item", None, Some(id.as_str())),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for recipe-line database operations and catalog loading.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    /// Creates a new RecipeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Loads the recipe lines of one item, in sort order.
    pub async fn lines_for(&self, owner_item_id: &str) -> DbResult<Vec<RecipeLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM recipe_lines \
             WHERE owner_item_id = ?1 ORDER BY sort_order, id"
        );
        let rows = sqlx::query_as::<_, RecipeLineRow>(&sql)
            .bind(owner_item_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RecipeLine::try_from).collect()
    }

    /// Replaces an item's entire recipe atomically.
    ///
    /// Recipe editing always submits the full line set; a delete-then-insert
    /// in one transaction keeps concurrent engine reads from ever seeing a
    /// half-written recipe.
    pub async fn replace_lines(&self, owner_item_id: &str, lines: &[RecipeLine]) -> DbResult<()> {
        debug!(
            owner_item_id = %owner_item_id,
            line_count = lines.len(),
            "Replacing recipe lines"
        );

        for line in lines {
            mise_core::validation::validate_quantity(line.quantity)
                .map_err(mise_core::EngineError::from)?;
            if line.owner_item_id != owner_item_id {
                return Err(DbError::Internal(format!(
                    "recipe line {} belongs to item {}, not {}",
                    line.id, line.owner_item_id, owner_item_id
                )));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM recipe_lines WHERE owner_item_id = ?1")
            .bind(owner_item_id)
            .execute(&mut *tx)
            .await?;

        for line in lines {
            let (item_type, material_id, linked_item_id) = reference_columns(line);

            sqlx::query(
                r#"
                INSERT INTO recipe_lines (
                    id, owner_item_id, item_type, material_id, linked_item_id,
                    quantity, unit, is_optional, selection_group, sort_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&line.id)
            .bind(&line.owner_item_id)
            .bind(item_type)
            .bind(material_id)
            .bind(linked_item_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .bind(line.is_optional)
            .bind(&line.selection_group)
            .bind(line.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Deletes an item's recipe entirely.
    pub async fn delete_lines(&self, owner_item_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM recipe_lines WHERE owner_item_id = ?1")
            .bind(owner_item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Loads the subgraph reachable from `root_item_id` into a [`Catalog`].
    ///
    /// Breadth-first over linked-item edges (optional and grouped lines
    /// included, since any of them may be selected), fetching each item's
    /// lines once. Unknown referenced ids are simply absent from the
    /// snapshot; the pure traversals turn them into warnings.
    pub async fn load_catalog(&self, root_item_id: &str) -> DbResult<Catalog> {
        let mut catalog = Catalog::new();

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen_items: HashSet<String> = HashSet::new();
        let mut wanted_materials: HashSet<String> = HashSet::new();

        queue.push_back(root_item_id.to_string());
        seen_items.insert(root_item_id.to_string());

        while let Some(item_id) = queue.pop_front() {
            let Some(item) = self.fetch_item(&item_id).await? else {
                // Dangling edge (or unknown root). The traversal layer
                // reports it; nothing to load.
                continue;
            };
            catalog.insert_item(item);

            for line in self.lines_for(&item_id).await? {
                match &line.reference {
                    RecipeRef::Material(material_id) => {
                        wanted_materials.insert(material_id.clone());
                    }
                    RecipeRef::LinkedItem(linked_id) => {
                        if seen_items.insert(linked_id.clone()) {
                            queue.push_back(linked_id.clone());
                        }
                    }
                }
                catalog.insert_line(line);
            }
        }

        for material_id in wanted_materials {
            if let Some(material) = self.fetch_material(&material_id).await? {
                catalog.insert_material(material);
            } else {
                warn!(material_id = %material_id, "Recipe references unknown material");
            }
        }

        debug!(
            root = %root_item_id,
            items = catalog.item_count(),
            "Loaded catalog snapshot"
        );

        Ok(catalog)
    }

    /// Loads the entire catalog: all active items, all materials, all lines.
    ///
    /// Price propagation walks reverse edges (material → every item using
    /// it), which a rooted BFS cannot provide.
    pub async fn load_full_catalog(&self) -> DbResult<Catalog> {
        let mut catalog = Catalog::new();

        let materials_sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials");
        for material in sqlx::query_as::<_, Material>(&materials_sql)
            .fetch_all(&self.pool)
            .await?
        {
            catalog.insert_material(material);
        }

        let items_sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE is_active = 1");
        for item in sqlx::query_as::<_, SellableItem>(&items_sql)
            .fetch_all(&self.pool)
            .await?
        {
            catalog.insert_item(item);
        }

        let lines_sql = format!("SELECT {LINE_COLUMNS} FROM recipe_lines ORDER BY sort_order, id");
        let rows = sqlx::query_as::<_, RecipeLineRow>(&lines_sql)
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            catalog.insert_line(RecipeLine::try_from(row)?);
        }

        Ok(catalog)
    }

    async fn fetch_item(&self, id: &str) -> DbResult<Option<SellableItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let item = sqlx::query_as::<_, SellableItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn fetch_material(&self, id: &str) -> DbResult<Option<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1");
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(material)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
