//! # Domain Types
//!
//! Core domain types for the recipe composition & COGS engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Material     │   │  SellableItem   │   │   RecipeLine    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  purchase_cost  │   │  external_id    │   │  owner_item_id  │       │
//! │  │  purchase_qty   │   │  base_price     │   │  reference ─────┼──┐    │
//! │  │  stock_quantity │   │  unit_cost      │   │  quantity       │  │    │
//! │  └─────────────────┘   │  (cached)       │   │  is_optional    │  │    │
//! │          ▲             └─────────────────┘   │  selection_group│  │    │
//! │          │                      ▲            └─────────────────┘  │    │
//! │          └──────────────────────┴── RecipeRef::Material ──────────┘    │
//! │                                     RecipeRef::LinkedItem              │
//! │                                                                         │
//! │  Ephemeral / derived:                                                   │
//! │  BundleSelection  - the buyer's concrete choices at cost time          │
//! │  CostResult       - total + per-leaf breakdown from the rollup         │
//! │  ConsumptionPlan  - planned stock draws, applied by mise-db            │
//! │  ConsumptionRecord- one persisted audit row per (order line, material) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numeric Semantics
//! Monetary values are `f64` in the shop's base currency unit. A material's
//! unit cost is a quotient (`purchase_cost / purchase_quantity`) and is kept
//! at full precision; totals are sums of line costs with no mid-calculation
//! rounding. Rounding, if any, happens at display time in the host app.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineWarning;

// =============================================================================
// Material
// =============================================================================

/// A raw ingredient or packaging material with purchase-based unit cost.
///
/// Owned by the purchasing/administration workflow; the engine only reads
/// it and, for `stock_quantity`, decrements at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Material {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name (e.g. "Espresso beans").
    pub name: String,

    /// Optional category for reporting (e.g. "Dairy").
    pub category: Option<String>,

    /// Reference to the supplier record, if any.
    pub supplier_id: Option<String>,

    /// The unit a batch is bought in (e.g. "bag", "case").
    pub purchase_unit: String,

    /// How many base units one purchase batch yields. Invariant: > 0.
    /// A non-positive value is tolerated at read time via the division
    /// guard in [`Material::unit_cost`].
    pub purchase_quantity: f64,

    /// Price paid for one purchase batch.
    pub purchase_cost: f64,

    /// Base units on hand. May go negative only as the result of an
    /// allowed oversell.
    pub stock_quantity: f64,

    /// Threshold below which the material shows up in low-stock reports.
    pub low_stock_threshold: f64,

    /// Whether the material is active (soft delete).
    pub is_active: bool,

    /// When the material was created.
    pub created_at: DateTime<Utc>,

    /// When the material was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Cost of one base unit: `purchase_cost / purchase_quantity`.
    ///
    /// Returns 0.0 when `purchase_quantity` is not positive (division
    /// guard). Callers that care emit [`EngineWarning::ZeroPurchaseQuantity`]
    /// via [`Material::has_valid_purchase_quantity`].
    pub fn unit_cost(&self) -> f64 {
        if self.purchase_quantity > 0.0 {
            self.purchase_cost / self.purchase_quantity
        } else {
            0.0
        }
    }

    /// Whether the unit-cost division is well defined.
    #[inline]
    pub fn has_valid_purchase_quantity(&self) -> bool {
        self.purchase_quantity > 0.0
    }

    /// Whether on-hand stock is at or below the low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Sellable Item
// =============================================================================

/// A catalog item a customer can buy: a simple product or a combo.
///
/// Owned by the catalog/administration workflow; the engine reads it and
/// refreshes the cached `unit_cost` during price propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SellableItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Opaque identifier of the external commerce platform's product record.
    pub external_id: String,

    /// Display name shown to the buyer and on receipts.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Optional category for menu grouping.
    pub category: Option<String>,

    /// Selling price of one unit.
    pub base_price: f64,

    /// Cached cost of one unit: the last rollup over the base recipe
    /// context, refreshed on recipe or material change.
    pub unit_cost: f64,

    /// Optional price override when the item is sold as part of a combo.
    pub combo_price_override: Option<f64>,

    /// Whether the item is itself stocked rather than composed.
    pub manage_stock: bool,

    /// On-hand quantity for stocked items (ignored when `manage_stock`
    /// is false).
    pub stock_quantity: f64,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Recipe Line
// =============================================================================

/// What a recipe line points at: exactly one of a material or another
/// sellable item.
///
/// Modelled as a tagged variant so the type system enforces the
/// one-reference-kind invariant that a loosely-typed row cannot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecipeRef {
    /// A raw material leaf.
    Material(String),
    /// Another sellable item (sub-bundle or primitive product).
    LinkedItem(String),
}

impl RecipeRef {
    /// The referenced entity's id, whichever kind it is.
    pub fn id(&self) -> &str {
        match self {
            RecipeRef::Material(id) => id,
            RecipeRef::LinkedItem(id) => id,
        }
    }

    /// Whether this reference points at a material.
    #[inline]
    pub fn is_material(&self) -> bool {
        matches!(self, RecipeRef::Material(_))
    }
}

/// One ingredient/component declaration on a sellable item's recipe.
///
/// Owned by recipe-editing administration; read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The sellable item this line belongs to.
    pub owner_item_id: String,

    /// The material or linked item this line includes.
    pub reference: RecipeRef,

    /// Multiplier applied per one unit of the owning item.
    pub quantity: f64,

    /// Display unit, independent of the material's purchase unit.
    pub unit: String,

    /// Buyer may add this line; it is never forced in.
    pub is_optional: bool,

    /// Lines sharing a group under the same owner are mutually exclusive;
    /// exactly one must be chosen if the group is mandatory.
    pub selection_group: Option<String>,

    /// Stable ordering within the owning recipe (display order).
    pub sort_order: i64,
}

impl RecipeLine {
    /// Whether this line is one alternative of a mandatory exclusive group.
    ///
    /// Optional lines are optional first: a group tag on an optional line
    /// does not make it mandatory.
    #[inline]
    pub fn is_group_alternative(&self) -> bool {
        !self.is_optional && self.selection_group.is_some()
    }
}

/// Builds the globally unique key of an exclusive-choice group.
///
/// The owner item id is part of the key so the same group name recurring
/// at different nesting levels (e.g. `size` on two different drinks inside
/// one combo) never collides.
pub fn group_key(owner_item_id: &str, selection_group: &str) -> String {
    format!("{owner_item_id}:{selection_group}")
}

// =============================================================================
// Bundle Selection
// =============================================================================

/// The buyer's concrete choices, supplied by the caller at cost and
/// consumption time. Ephemeral; never persisted by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleSelection {
    /// Chosen alternative per mandatory exclusive group, keyed by the
    /// global group key (see [`group_key`]). The value is the chosen
    /// line's referenced identity (material id or linked item id).
    pub selected_mandatory: HashMap<String, String>,

    /// Chosen optional add-ons, as the set of chosen RecipeLine ids.
    pub selected_optional: HashSet<String>,
}

impl BundleSelection {
    /// An empty selection: no groups resolved, no optionals chosen.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style: resolve a mandatory group to a referenced identity.
    pub fn choose(mut self, group_key: impl Into<String>, reference_id: impl Into<String>) -> Self {
        self.selected_mandatory
            .insert(group_key.into(), reference_id.into());
        self
    }

    /// Builder-style: add an optional line by its RecipeLine id.
    pub fn add_optional(mut self, line_id: impl Into<String>) -> Self {
        self.selected_optional.insert(line_id.into());
        self
    }

    /// Looks up the chosen referenced identity for a group key.
    pub fn chosen_for(&self, key: &str) -> Option<&str> {
        self.selected_mandatory.get(key).map(String::as_str)
    }

    /// Whether an optional line id was chosen.
    pub fn optional_chosen(&self, line_id: &str) -> bool {
        self.selected_optional.contains(line_id)
    }
}

// =============================================================================
// Flattened Choices (resolver output)
// =============================================================================

/// One selectable alternative inside a flattened group, or the payload of
/// an optional add-on: the line plus its resolved display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// The underlying RecipeLine id.
    pub line_id: String,

    /// What the line references (material or linked item).
    pub reference: RecipeRef,

    /// Resolved display name of the referenced material/item.
    pub name: String,

    /// Quantity per one unit of the owning item.
    pub quantity: f64,

    /// Display unit.
    pub unit: String,
}

/// A flattened mandatory exclusive-choice group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceGroup {
    /// Globally unique key: `owner_item_id + ":" + selection_group`.
    pub key: String,

    /// The bare group tag, for display (e.g. "size", "temperature").
    pub display_name: String,

    /// The item that declared the group (may be nested below the root).
    pub owner_item_id: String,

    /// The mutually exclusive alternatives; exactly one must be chosen.
    pub options: Vec<ChoiceOption>,
}

/// An optional add-on surfaced by the resolver, tagged with the item that
/// declared it so a nested add-on can be displayed in context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionalAddOn {
    /// The underlying RecipeLine id (this is what goes into
    /// [`BundleSelection::selected_optional`]).
    pub line_id: String,

    /// What the line references.
    pub reference: RecipeRef,

    /// Resolved display name of the referenced material/item.
    pub name: String,

    /// Quantity per one unit of the declaring item.
    pub quantity: f64,

    /// Display unit.
    pub unit: String,

    /// Id of the item whose recipe declared the optional line.
    pub declared_by_item_id: String,

    /// Name of the declaring item, for display.
    pub declared_by_item_name: String,
}

/// Result of [`crate::resolver::flatten_choices`]: every choice the buyer
/// must or may make, surfaced at one level regardless of nesting depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlattenedChoices {
    /// Mandatory exclusive-choice groups, in discovery order.
    pub groups: Vec<ChoiceGroup>,

    /// Optional add-ons, in discovery order.
    pub optionals: Vec<OptionalAddOn>,

    /// Data-integrity warnings encountered during the walk.
    pub warnings: Vec<EngineWarning>,
}

// =============================================================================
// Cost Rollup (calculator output)
// =============================================================================

/// One charged leaf in a cost breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLine {
    /// Display name of the charged material or primitive item.
    pub name: String,

    /// Material id when the leaf is a material; `None` for a primitive
    /// linked item charged at its cached unit cost.
    pub material_id: Option<String>,

    /// Cost of one base unit at calculation time.
    pub unit_cost: f64,

    /// Resolved quantity after multiplying through every enclosing level.
    pub quantity: f64,

    /// `unit_cost * quantity`, unrounded.
    pub line_cost: f64,
}

/// Result of [`crate::rollup::calculate_cost`].
///
/// Invariant: `total_cost` equals the sum of `breakdown[i].line_cost`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostResult {
    /// Total monetary cost for the requested quantity.
    pub total_cost: f64,

    /// Every leaf actually charged, sufficient to reconstruct
    /// `total_cost` by summation.
    pub breakdown: Vec<CostLine>,

    /// True when the item was not found: the caller should display
    /// "cost unknown" instead of treating 0.0 as a price. An existing
    /// item with no recipe lines is a primitive charged at its cached
    /// unit cost, so it is not flagged.
    pub no_recipe: bool,

    /// Warnings encountered during the walk.
    pub warnings: Vec<EngineWarning>,
}

// =============================================================================
// Consumption (recorder types)
// =============================================================================

/// One planned stock draw: the consumption recorder's pure half.
///
/// mise-db applies a plan transactionally, decrementing stock and inserting
/// one [`ConsumptionRecord`] per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedDraw {
    /// The material to draw from.
    pub material_id: String,

    /// Display name, snapshotted for logging/reporting convenience.
    pub material_name: String,

    /// Base units to deduct.
    pub quantity: f64,

    /// Cost charged at the live unit cost at planning time.
    pub cost: f64,
}

/// Result of [`crate::consumption::plan_consumption`].
///
/// A material referenced at two different nesting depths appears as two
/// entries; the plan never coalesces draws.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumptionPlan {
    /// Planned draws in traversal order.
    pub entries: Vec<PlannedDraw>,

    /// Warnings encountered during the walk.
    pub warnings: Vec<EngineWarning>,
}

impl ConsumptionPlan {
    /// Total cost across all planned draws. For graphs whose leaves are
    /// all materials this equals the rollup calculator's `total_cost`
    /// for the same inputs.
    pub fn total_cost(&self) -> f64 {
        self.entries.iter().map(|e| e.cost).sum()
    }
}

/// One persisted audit row: how much of one material was used for one
/// sold order line.
///
/// Lifecycle: created once per (order line, material draw) when a sale is
/// confirmed; never updated; deleted only by bulk historical resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ConsumptionRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Opaque external order id.
    pub order_id: String,

    /// Opaque external order-line id.
    pub order_line_id: String,

    /// The material consumed.
    pub material_id: String,

    /// Base units consumed.
    pub quantity: f64,

    /// Cost charged at the live unit cost at consumption time (not at
    /// recipe-authoring time).
    pub cost: f64,

    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
