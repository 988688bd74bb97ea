//! # Repository Modules
//!
//! Database repositories implementing the data access layer.
//!
//! ## Pattern
//! Each repository owns a pool clone and exposes async methods for one
//! aggregate. Business logic does NOT live here; repositories load and
//! persist, `mise-core` decides.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Repository Layer                                  │
//! │                                                                         │
//! │  MaterialRepository    ──► materials            (purchasing, stock)    │
//! │  ItemRepository        ──► items                (catalog, cached cost) │
//! │  RecipeRepository      ──► recipe_lines         (graph edges,          │
//! │                                                  Catalog snapshots)    │
//! │  ConsumptionRepository ──► consumption_records  (audit, COGS reports)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod consumption;
pub mod item;
pub mod material;
pub mod recipe;

pub use consumption::ConsumptionRepository;
pub use item::ItemRepository;
pub use material::MaterialRepository;
pub use recipe::RecipeRepository;

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod test_fixtures {
    use chrono::Utc;
    use uuid::Uuid;

    use mise_core::{Material, RecipeLine, RecipeRef, SellableItem};

    /// A material fixture with the given purchase economics and stock.
    pub fn material_fixture(
        name: &str,
        purchase_quantity: f64,
        purchase_cost: f64,
        stock_quantity: f64,
    ) -> Material {
        let now = Utc::now();
        Material {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: None,
            supplier_id: None,
            purchase_unit: "batch".to_string(),
            purchase_quantity,
            purchase_cost,
            stock_quantity,
            low_stock_threshold: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// A sellable-item fixture with a generated external id.
    pub fn item_fixture(name: &str, base_price: f64) -> SellableItem {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        SellableItem {
            external_id: format!("ext-{id}"),
            id,
            name: name.to_string(),
            sku: format!("SKU-{name}").to_uppercase().replace(' ', "-"),
            category: None,
            base_price,
            unit_cost: 0.0,
            combo_price_override: None,
            manage_stock: false,
            stock_quantity: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// A mandatory recipe line drawing a material.
    pub fn material_line(owner: &str, material_id: &str, quantity: f64) -> RecipeLine {
        RecipeLine {
            id: Uuid::new_v4().to_string(),
            owner_item_id: owner.to_string(),
            reference: RecipeRef::Material(material_id.to_string()),
            quantity,
            unit: "unit".to_string(),
            is_optional: false,
            selection_group: None,
            sort_order: 0,
        }
    }

    /// A recipe line linking another sellable item.
    pub fn linked_line(owner: &str, linked_item_id: &str, quantity: f64) -> RecipeLine {
        RecipeLine {
            id: Uuid::new_v4().to_string(),
            owner_item_id: owner.to_string(),
            reference: RecipeRef::LinkedItem(linked_item_id.to_string()),
            quantity,
            unit: "unit".to_string(),
            is_optional: false,
            selection_group: None,
            sort_order: 0,
        }
    }
}
