//! Test fixtures shared by the core unit tests.
//!
//! Builders keep individual tests focused on graph shape instead of
//! struct field noise.

use chrono::Utc;

use crate::catalog::Catalog;
use crate::types::{Material, RecipeLine, RecipeRef, SellableItem};

/// A material with the given purchase economics and plenty of stock.
pub(crate) fn material_with(id: &str, name: &str, purchase_quantity: f64, purchase_cost: f64) -> Material {
    let now = Utc::now();
    Material {
        id: id.to_string(),
        name: name.to_string(),
        category: None,
        supplier_id: None,
        purchase_unit: "batch".to_string(),
        purchase_quantity,
        purchase_cost,
        stock_quantity: 100.0,
        low_stock_threshold: 0.0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A sellable item with zeroed prices and no managed stock.
pub(crate) fn item(id: &str, name: &str) -> SellableItem {
    let now = Utc::now();
    SellableItem {
        id: id.to_string(),
        external_id: format!("ext-{id}"),
        name: name.to_string(),
        sku: id.to_uppercase(),
        category: None,
        base_price: 0.0,
        unit_cost: 0.0,
        combo_price_override: None,
        manage_stock: false,
        stock_quantity: 0.0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A mandatory material line.
pub(crate) fn line_material(line_id: &str, owner: &str, material_id: &str, quantity: f64) -> RecipeLine {
    RecipeLine {
        id: line_id.to_string(),
        owner_item_id: owner.to_string(),
        reference: RecipeRef::Material(material_id.to_string()),
        quantity,
        unit: "unit".to_string(),
        is_optional: false,
        selection_group: None,
        sort_order: 0,
    }
}

/// A mandatory linked-item line.
pub(crate) fn line_linked(line_id: &str, owner: &str, linked_item_id: &str, quantity: f64) -> RecipeLine {
    RecipeLine {
        id: line_id.to_string(),
        owner_item_id: owner.to_string(),
        reference: RecipeRef::LinkedItem(linked_item_id.to_string()),
        quantity,
        unit: "unit".to_string(),
        is_optional: false,
        selection_group: None,
        sort_order: 0,
    }
}

/// An optional line with an arbitrary reference.
pub(crate) fn line_optional(line_id: &str, owner: &str, reference: RecipeRef, quantity: f64) -> RecipeLine {
    RecipeLine {
        id: line_id.to_string(),
        owner_item_id: owner.to_string(),
        reference,
        quantity,
        unit: "unit".to_string(),
        is_optional: true,
        selection_group: None,
        sort_order: 0,
    }
}

/// Tags a line as one alternative of a mandatory exclusive group.
pub(crate) fn in_group(mut line: RecipeLine, group: &str) -> RecipeLine {
    line.selection_group = Some(group.to_string());
    line
}

/// The worked combo from the engine's acceptance checks:
///
/// ```text
/// Combo
/// ├── [group "size"] Small drink  → 2 × Material A (unit cost 0.50)
/// ├── [group "size"] Large drink  → 3 × Material A
/// └── (optional)     Cookie       → 1 × Material B (unit cost 1.20)
/// ```
///
/// Small/Large are linked items so the selection exercises nested rollup.
/// Returns the catalog; fixed ids: combo, drink-small, drink-large, cookie,
/// mat-a, mat-b, lines l-small, l-large, l-cookie.
pub(crate) fn combo_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.insert_material(material_with("mat-a", "Syrup", 10.0, 5.0)); // 0.50/unit
    catalog.insert_material(material_with("mat-b", "Cookie dough", 10.0, 12.0)); // 1.20/unit

    catalog.insert_item(item("combo", "Combo"));
    catalog.insert_item(item("drink-small", "Small Drink"));
    catalog.insert_item(item("drink-large", "Large Drink"));
    catalog.insert_item(item("cookie", "Cookie"));

    catalog.insert_line(line_material("l-small-a", "drink-small", "mat-a", 2.0));
    catalog.insert_line(line_material("l-large-a", "drink-large", "mat-a", 3.0));
    catalog.insert_line(line_material("l-cookie-b", "cookie", "mat-b", 1.0));

    let mut small = in_group(line_linked("l-small", "combo", "drink-small", 1.0), "size");
    small.sort_order = 0;
    let mut large = in_group(line_linked("l-large", "combo", "drink-large", 1.0), "size");
    large.sort_order = 1;
    let mut cookie = line_optional(
        "l-cookie",
        "combo",
        RecipeRef::LinkedItem("cookie".to_string()),
        1.0,
    );
    cookie.is_optional = true;
    cookie.sort_order = 2;

    catalog.insert_line(small);
    catalog.insert_line(large);
    catalog.insert_line(cookie);

    catalog
}
