//! Integration tests for the database-backed COGS engine: catalog
//! persistence, choice flattening, cost quotes, transactional sale
//! recording, and price propagation, all against in-memory SQLite.

use chrono::Utc;
use uuid::Uuid;

use mise_core::{BundleSelection, EngineWarning, Material, RecipeLine, RecipeRef, SellableItem};
use mise_db::{Database, DbConfig, DbError};

// =============================================================================
// Fixture Helpers
// =============================================================================

fn material(name: &str, purchase_quantity: f64, purchase_cost: f64, stock: f64) -> Material {
    let now = Utc::now();
    Material {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        category: None,
        supplier_id: None,
        purchase_unit: "batch".to_string(),
        purchase_quantity,
        purchase_cost,
        stock_quantity: stock,
        low_stock_threshold: 0.0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn item(name: &str) -> SellableItem {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();
    SellableItem {
        external_id: format!("ext-{id}"),
        id,
        name: name.to_string(),
        sku: format!("SKU-{name}").to_uppercase().replace(' ', "-"),
        category: None,
        base_price: 5.0,
        unit_cost: 0.0,
        combo_price_override: None,
        manage_stock: false,
        stock_quantity: 0.0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn line(owner: &str, reference: RecipeRef, quantity: f64) -> RecipeLine {
    RecipeLine {
        id: Uuid::new_v4().to_string(),
        owner_item_id: owner.to_string(),
        reference,
        quantity,
        unit: "unit".to_string(),
        is_optional: false,
        selection_group: None,
        sort_order: 0,
    }
}

/// The seeded combo scenario:
///
/// - Syrup: 10 units per batch at 5.00 (0.50/unit)
/// - Cookie dough: 10 units per batch at 12.00 (1.20/unit)
/// - Small drink = 2 syrup (1.00), Large drink = 3 syrup (1.50)
/// - Cookie = 1 dough (1.20)
/// - Combo = size group {Small, Large} + optional cookie
struct ComboFixture {
    db: Database,
    syrup_id: String,
    dough_id: String,
    small_id: String,
    large_id: String,
    cookie_id: String,
    combo_id: String,
    cookie_line_id: String,
}

async fn combo_fixture() -> ComboFixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let syrup = material("Syrup", 10.0, 5.0, 100.0);
    let dough = material("Cookie dough", 10.0, 12.0, 100.0);
    db.materials().insert(&syrup).await.unwrap();
    db.materials().insert(&dough).await.unwrap();

    let small = item("Small Drink");
    let large = item("Large Drink");
    let cookie = item("Cookie");
    let combo = item("Combo");
    for it in [&small, &large, &cookie, &combo] {
        db.items().insert(it).await.unwrap();
    }

    db.recipes()
        .replace_lines(
            &small.id,
            &[line(&small.id, RecipeRef::Material(syrup.id.clone()), 2.0)],
        )
        .await
        .unwrap();
    db.recipes()
        .replace_lines(
            &large.id,
            &[line(&large.id, RecipeRef::Material(syrup.id.clone()), 3.0)],
        )
        .await
        .unwrap();
    db.recipes()
        .replace_lines(
            &cookie.id,
            &[line(&cookie.id, RecipeRef::Material(dough.id.clone()), 1.0)],
        )
        .await
        .unwrap();

    let mut pick_small = line(&combo.id, RecipeRef::LinkedItem(small.id.clone()), 1.0);
    pick_small.selection_group = Some("size".to_string());
    pick_small.sort_order = 0;
    let mut pick_large = line(&combo.id, RecipeRef::LinkedItem(large.id.clone()), 1.0);
    pick_large.selection_group = Some("size".to_string());
    pick_large.sort_order = 1;
    let mut add_cookie = line(&combo.id, RecipeRef::LinkedItem(cookie.id.clone()), 1.0);
    add_cookie.is_optional = true;
    add_cookie.sort_order = 2;
    let cookie_line_id = add_cookie.id.clone();

    db.recipes()
        .replace_lines(&combo.id, &[pick_small, pick_large, add_cookie])
        .await
        .unwrap();

    ComboFixture {
        db,
        syrup_id: syrup.id,
        dough_id: dough.id,
        small_id: small.id,
        large_id: large.id,
        cookie_id: cookie.id,
        combo_id: combo.id,
        cookie_line_id,
    }
}

fn large_with_cookie(fx: &ComboFixture) -> BundleSelection {
    BundleSelection::empty()
        .choose(
            mise_core::group_key(&fx.combo_id, "size"),
            fx.large_id.clone(),
        )
        .add_optional(fx.cookie_line_id.clone())
}

async fn stock_of(db: &Database, material_id: &str) -> f64 {
    db.materials()
        .get_by_id(material_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

// =============================================================================
// Flattening & Quoting
// =============================================================================

#[tokio::test]
async fn flatten_surfaces_combo_choices() {
    let fx = combo_fixture().await;

    let choices = fx.db.engine().flatten_choices(&fx.combo_id).await.unwrap();

    assert_eq!(choices.groups.len(), 1);
    let group = &choices.groups[0];
    assert_eq!(group.display_name, "size");
    assert_eq!(group.key, mise_core::group_key(&fx.combo_id, "size"));
    assert_eq!(group.options.len(), 2);

    assert_eq!(choices.optionals.len(), 1);
    assert_eq!(choices.optionals[0].name, "Cookie");
    assert!(choices.warnings.is_empty());
}

#[tokio::test]
async fn flatten_unknown_root_is_hard_error() {
    let fx = combo_fixture().await;

    let err = fx.db.engine().flatten_choices("no-such-item").await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Engine(mise_core::EngineError::ItemNotFound(_))
    ));
}

#[tokio::test]
async fn quote_matches_worked_example() {
    let fx = combo_fixture().await;

    // Large + cookie: 3 * 0.50 + 1 * 1.20 = 2.70
    let cost = fx
        .db
        .engine()
        .calculate_cost(&fx.combo_id, 1.0, Some(&large_with_cookie(&fx)))
        .await
        .unwrap();
    assert!((cost.total_cost - 2.70).abs() < 1e-9);
    assert_eq!(cost.breakdown.len(), 2);
    assert!(!cost.no_recipe);

    // Large only: 1.50
    let selection = BundleSelection::empty().choose(
        mise_core::group_key(&fx.combo_id, "size"),
        fx.large_id.clone(),
    );
    let cost = fx
        .db
        .engine()
        .calculate_cost(&fx.combo_id, 1.0, Some(&selection))
        .await
        .unwrap();
    assert!((cost.total_cost - 1.50).abs() < 1e-9);
    assert_eq!(cost.breakdown.len(), 1);
}

#[tokio::test]
async fn quote_for_primitive_item_charges_cached_cost() {
    let fx = combo_fixture().await;

    // A stocked retail product with no recipe behind it.
    let mut bottled = item("Bottled Water");
    bottled.unit_cost = 0.35;
    fx.db.items().insert(&bottled).await.unwrap();

    let cost = fx
        .db
        .engine()
        .calculate_cost(&bottled.id, 2.0, None)
        .await
        .unwrap();
    assert!(!cost.no_recipe);
    assert!((cost.total_cost - 0.70).abs() < 1e-9);
    assert_eq!(cost.breakdown.len(), 1);
    assert!(cost.breakdown[0].material_id.is_none());
}

#[tokio::test]
async fn quote_for_unknown_item_degrades() {
    let fx = combo_fixture().await;

    let cost = fx
        .db
        .engine()
        .calculate_cost("no-such-item", 1.0, None)
        .await
        .unwrap();
    assert!(cost.no_recipe);
    assert_eq!(cost.total_cost, 0.0);
}

// =============================================================================
// Sale Recording
// =============================================================================

#[tokio::test]
async fn record_sale_matches_quote_and_decrements_stock() {
    let fx = combo_fixture().await;
    let selection = large_with_cookie(&fx);

    let quote = fx
        .db
        .engine()
        .calculate_cost(&fx.combo_id, 1.0, Some(&selection))
        .await
        .unwrap();

    let sale = fx
        .db
        .engine()
        .record_sale("ord-1", "line-1", &fx.combo_id, 1.0, Some(&selection))
        .await
        .unwrap();

    assert!((sale.total_cost() - quote.total_cost).abs() < 1e-9);
    assert_eq!(sale.records.len(), 2);
    assert!(sale.warnings.is_empty());

    // Large drink drew 3 syrup, cookie drew 1 dough.
    assert!((stock_of(&fx.db, &fx.syrup_id).await - 97.0).abs() < 1e-9);
    assert!((stock_of(&fx.db, &fx.dough_id).await - 99.0).abs() < 1e-9);

    // Audit rows query back by order and line, with matching COGS.
    let records = fx.db.consumption().list_by_order("ord-1").await.unwrap();
    assert_eq!(records.len(), 2);
    let cogs = fx.db.consumption().order_line_cogs("line-1").await.unwrap();
    assert!((cogs - 2.70).abs() < 1e-9);
}

#[tokio::test]
async fn unselected_optional_consumes_nothing() {
    let fx = combo_fixture().await;

    let selection = BundleSelection::empty().choose(
        mise_core::group_key(&fx.combo_id, "size"),
        fx.small_id.clone(),
    );

    let sale = fx
        .db
        .engine()
        .record_sale("ord-1", "line-1", &fx.combo_id, 1.0, Some(&selection))
        .await
        .unwrap();

    // Small drink only: 2 syrup, no dough.
    assert_eq!(sale.records.len(), 1);
    assert!((stock_of(&fx.db, &fx.syrup_id).await - 98.0).abs() < 1e-9);
    assert!((stock_of(&fx.db, &fx.dough_id).await - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_sales_deduct_cumulatively() {
    let fx = combo_fixture().await;
    let selection = large_with_cookie(&fx);

    for line_no in 0..2 {
        fx.db
            .engine()
            .record_sale("ord-1", &format!("line-{line_no}"), &fx.combo_id, 1.0, Some(&selection))
            .await
            .unwrap();
    }

    assert!((stock_of(&fx.db, &fx.syrup_id).await - 94.0).abs() < 1e-9);
    assert!((stock_of(&fx.db, &fx.dough_id).await - 98.0).abs() < 1e-9);

    let cogs = fx.db.consumption().order_cogs("ord-1").await.unwrap();
    assert!((cogs - 5.40).abs() < 1e-9);
}

#[tokio::test]
async fn sale_quantity_scales_draws() {
    let fx = combo_fixture().await;

    let selection = BundleSelection::empty().choose(
        mise_core::group_key(&fx.combo_id, "size"),
        fx.large_id.clone(),
    );

    let sale = fx
        .db
        .engine()
        .record_sale("ord-1", "line-1", &fx.combo_id, 3.0, Some(&selection))
        .await
        .unwrap();

    // 3 combos * 3 syrup each
    assert_eq!(sale.records.len(), 1);
    assert!((sale.records[0].quantity - 9.0).abs() < 1e-9);
    assert!((stock_of(&fx.db, &fx.syrup_id).await - 91.0).abs() < 1e-9);
}

#[tokio::test]
async fn oversell_goes_negative_with_warning() {
    let fx = combo_fixture().await;

    fx.db.materials().adjust_stock(&fx.syrup_id, -99.0).await.unwrap();

    let selection = BundleSelection::empty().choose(
        mise_core::group_key(&fx.combo_id, "size"),
        fx.large_id.clone(),
    );

    let sale = fx
        .db
        .engine()
        .record_sale("ord-1", "line-1", &fx.combo_id, 1.0, Some(&selection))
        .await
        .unwrap();

    // Sale goes through; stock is now negative and flagged.
    assert_eq!(sale.records.len(), 1);
    assert!((stock_of(&fx.db, &fx.syrup_id).await - (-2.0)).abs() < 1e-9);
    assert!(sale
        .warnings
        .iter()
        .any(|w| matches!(w, EngineWarning::Oversold { material_id, .. } if *material_id == fx.syrup_id)));
}

#[tokio::test]
async fn record_sale_unknown_item_is_hard_error() {
    let fx = combo_fixture().await;

    let err = fx
        .db
        .engine()
        .record_sale("ord-1", "line-1", "no-such-item", 1.0, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Engine(mise_core::EngineError::ItemNotFound(_))
    ));

    assert!(fx.db.consumption().list_by_order("ord-1").await.unwrap().is_empty());
}

// =============================================================================
// Price Propagation
// =============================================================================

#[tokio::test]
async fn material_price_change_refreshes_cached_costs() {
    let fx = combo_fixture().await;

    // Baseline cached costs
    fx.db.engine().refresh_item_cost(&fx.small_id).await.unwrap();
    fx.db.engine().refresh_item_cost(&fx.large_id).await.unwrap();

    let small = fx.db.items().get_by_id(&fx.small_id).await.unwrap().unwrap();
    assert!((small.unit_cost - 1.0).abs() < 1e-9);

    // Syrup doubles: 10 units per batch now cost 10.00 (1.00/unit)
    let mut syrup = fx
        .db
        .materials()
        .get_by_id(&fx.syrup_id)
        .await
        .unwrap()
        .unwrap();
    syrup.purchase_cost = 10.0;
    fx.db.materials().update(&syrup).await.unwrap();

    let refreshed = fx
        .db
        .engine()
        .on_material_price_change(&fx.syrup_id)
        .await
        .unwrap();

    // Both drinks and the combo use syrup; the cookie does not.
    let refreshed_ids: Vec<&str> = refreshed.iter().map(|r| r.item_id.as_str()).collect();
    assert!(refreshed_ids.contains(&fx.small_id.as_str()));
    assert!(refreshed_ids.contains(&fx.large_id.as_str()));
    assert!(refreshed_ids.contains(&fx.combo_id.as_str()));
    assert!(!refreshed_ids.contains(&fx.cookie_id.as_str()));

    // Drinks refresh before the combo that contains them.
    let pos = |id: &str| refreshed_ids.iter().position(|x| *x == id).unwrap();
    assert!(pos(&fx.small_id) < pos(&fx.combo_id));
    assert!(pos(&fx.large_id) < pos(&fx.combo_id));

    let small = fx.db.items().get_by_id(&fx.small_id).await.unwrap().unwrap();
    let large = fx.db.items().get_by_id(&fx.large_id).await.unwrap().unwrap();
    assert!((small.unit_cost - 2.0).abs() < 1e-9);
    assert!((large.unit_cost - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn refresh_item_cost_persists_rollup() {
    let fx = combo_fixture().await;

    let cost = fx.db.engine().refresh_item_cost(&fx.cookie_id).await.unwrap();
    assert!((cost.total_cost - 1.20).abs() < 1e-9);

    let cookie = fx.db.items().get_by_id(&fx.cookie_id).await.unwrap().unwrap();
    assert!((cookie.unit_cost - 1.20).abs() < 1e-9);
}

#[tokio::test]
async fn refresh_primitive_item_leaves_cached_cost_untouched() {
    let fx = combo_fixture().await;

    let mut bottled = item("Bottled Water");
    bottled.unit_cost = 0.35;
    fx.db.items().insert(&bottled).await.unwrap();

    let cost = fx.db.engine().refresh_item_cost(&bottled.id).await.unwrap();
    assert!((cost.total_cost - 0.35).abs() < 1e-9);

    let stored = fx.db.items().get_by_id(&bottled.id).await.unwrap().unwrap();
    assert!((stored.unit_cost - 0.35).abs() < 1e-9);
}

#[tokio::test]
async fn price_change_of_unknown_material_is_hard_error() {
    let fx = combo_fixture().await;

    let err = fx
        .db
        .engine()
        .on_material_price_change("no-such-material")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Engine(mise_core::EngineError::MaterialNotFound(_))
    ));
}

#[tokio::test]
async fn price_change_of_unreferenced_material_refreshes_nothing() {
    let fx = combo_fixture().await;

    let lonely = material("Napkins", 100.0, 3.0, 500.0);
    fx.db.materials().insert(&lonely).await.unwrap();

    let refreshed = fx
        .db
        .engine()
        .on_material_price_change(&lonely.id)
        .await
        .unwrap();
    assert!(refreshed.is_empty());
}
