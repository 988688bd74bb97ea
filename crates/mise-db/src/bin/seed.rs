//! # Seed Data Generator
//!
//! Populates the database with a demo café catalog for development:
//! materials with purchase-based costs, simple drinks composed from
//! materials, and a combo with a size choice and an optional cookie.
//!
//! ## Usage
//! ```bash
//! # Seed into the default dev database
//! cargo run -p mise-db --bin seed
//!
//! # Specify database path
//! cargo run -p mise-db --bin seed -- --db ./data/mise.db
//!
//! # Also run a demo sale against the seeded combo
//! cargo run -p mise-db --bin seed -- --demo-sale
//! ```

use chrono::Utc;
use std::env;
use uuid::Uuid;

use mise_core::{BundleSelection, Material, RecipeLine, RecipeRef, SellableItem};
use mise_db::{Database, DbConfig};

/// (name, category, purchase_unit, purchase_quantity, purchase_cost, stock)
const MATERIALS: &[(&str, &str, &str, f64, f64, f64)] = &[
    ("Espresso beans", "Coffee", "1kg bag", 1000.0, 18.0, 5000.0),
    ("Whole milk", "Dairy", "1L carton", 1000.0, 1.2, 12000.0),
    ("Vanilla syrup", "Flavoring", "700ml bottle", 700.0, 7.0, 2100.0),
    ("Cookie dough", "Bakery", "10pc batch", 10.0, 12.0, 60.0),
    ("12oz cup", "Packaging", "case of 500", 500.0, 22.5, 1500.0),
    ("16oz cup", "Packaging", "case of 500", 500.0, 26.0, 1500.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mise_dev.db");
    let mut demo_sale = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo-sale" => {
                demo_sale = true;
            }
            "--help" | "-h" => {
                println!("Mise POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./mise_dev.db)");
                println!("      --demo-sale    Record a demo sale after seeding");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mise POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding materials...");

    let mut material_ids = Vec::new();
    for (name, category, unit, qty, cost, stock) in MATERIALS {
        let material = make_material(name, category, unit, *qty, *cost, *stock);
        db.materials().insert(&material).await?;
        println!(
            "  {} ({:.4}/unit)",
            material.name,
            material.unit_cost()
        );
        material_ids.push(material.id);
    }
    let [beans, milk, syrup, dough, cup_small, cup_large] = material_ids.as_slice() else {
        unreachable!("seed material count");
    };

    println!();
    println!("Seeding items and recipes...");

    // Simple composed drinks
    let latte_small = make_item("Latte 12oz", "LAT-12", 3.8);
    let latte_large = make_item("Latte 16oz", "LAT-16", 4.6);
    let cookie = make_item("Cookie", "CKE-01", 2.5);
    db.items().insert(&latte_small).await?;
    db.items().insert(&latte_large).await?;
    db.items().insert(&cookie).await?;

    db.recipes()
        .replace_lines(
            &latte_small.id,
            &[
                material_line(&latte_small.id, beans, 18.0, "g", 0),
                material_line(&latte_small.id, milk, 220.0, "ml", 1),
                material_line(&latte_small.id, cup_small, 1.0, "pc", 2),
            ],
        )
        .await?;
    db.recipes()
        .replace_lines(
            &latte_large.id,
            &[
                material_line(&latte_large.id, beans, 24.0, "g", 0),
                material_line(&latte_large.id, milk, 320.0, "ml", 1),
                material_line(&latte_large.id, cup_large, 1.0, "pc", 2),
            ],
        )
        .await?;
    db.recipes()
        .replace_lines(&cookie.id, &[material_line(&cookie.id, dough, 1.0, "pc", 0)])
        .await?;

    // Combo: pick a latte size, optionally add a cookie and vanilla.
    let combo = make_item("Latte Combo", "CMB-01", 6.5);
    db.items().insert(&combo).await?;

    let mut size_small = linked_line(&combo.id, &latte_small.id, 1.0, 0);
    size_small.selection_group = Some("size".to_string());
    let mut size_large = linked_line(&combo.id, &latte_large.id, 1.0, 1);
    size_large.selection_group = Some("size".to_string());
    let mut add_cookie = linked_line(&combo.id, &cookie.id, 1.0, 2);
    add_cookie.is_optional = true;
    let mut add_vanilla = material_line(&combo.id, syrup, 15.0, "ml", 3);
    add_vanilla.is_optional = true;

    db.recipes()
        .replace_lines(&combo.id, &[size_small, size_large, add_cookie, add_vanilla])
        .await?;

    println!("  {} / {} / {} / {}", latte_small.name, latte_large.name, cookie.name, combo.name);

    // Refresh cached costs bottom-up
    println!();
    println!("Refreshing cached unit costs...");
    for item_id in [&latte_small.id, &latte_large.id, &cookie.id, &combo.id] {
        let cost = db.engine().refresh_item_cost(item_id).await?;
        let item = db.items().get_by_id(item_id).await?.unwrap();
        println!("  {:<14} unit_cost = {:.4}", item.name, cost.total_cost);
    }

    // Show what the choice resolver surfaces for the combo
    println!();
    println!("Combo choices:");
    let choices = db.engine().flatten_choices(&combo.id).await?;
    for group in &choices.groups {
        let names: Vec<&str> = group.options.iter().map(|o| o.name.as_str()).collect();
        println!("  [{}] one of: {}", group.display_name, names.join(", "));
    }
    for optional in &choices.optionals {
        println!("  (optional) {}", optional.name);
    }

    if demo_sale {
        println!();
        println!("Recording demo sale (large combo + cookie)...");

        let group = &choices.groups[0];
        let large_option = group
            .options
            .iter()
            .find(|o| o.reference == RecipeRef::LinkedItem(latte_large.id.clone()))
            .expect("large latte option");
        let cookie_optional = choices
            .optionals
            .iter()
            .find(|o| o.reference == RecipeRef::LinkedItem(cookie.id.clone()))
            .expect("cookie optional");

        let selection = BundleSelection::empty()
            .choose(group.key.clone(), large_option.reference.id())
            .add_optional(cookie_optional.line_id.clone());

        let sale = db
            .engine()
            .record_sale("demo-order", "demo-line", &combo.id, 1.0, Some(&selection))
            .await?;

        println!("  {} draws, COGS = {:.4}", sale.records.len(), sale.total_cost());
        for warning in &sale.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn make_material(
    name: &str,
    category: &str,
    purchase_unit: &str,
    purchase_quantity: f64,
    purchase_cost: f64,
    stock_quantity: f64,
) -> Material {
    let now = Utc::now();
    Material {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        category: Some(category.to_string()),
        supplier_id: None,
        purchase_unit: purchase_unit.to_string(),
        purchase_quantity,
        purchase_cost,
        stock_quantity,
        low_stock_threshold: purchase_quantity * 0.5,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn make_item(name: &str, sku: &str, base_price: f64) -> SellableItem {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();
    SellableItem {
        external_id: format!("ext-{sku}"),
        id,
        name: name.to_string(),
        sku: sku.to_string(),
        category: Some("Café".to_string()),
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

fn material_line(owner: &str, material_id: &str, quantity: f64, unit: &str, sort: i64) -> RecipeLine {
    RecipeLine {
        id: Uuid::new_v4().to_string(),
        owner_item_id: owner.to_string(),
        reference: RecipeRef::Material(material_id.to_string()),
        quantity,
        unit: unit.to_string(),
        is_optional: false,
        selection_group: None,
        sort_order: sort,
    }
}

fn linked_line(owner: &str, linked_item_id: &str, quantity: f64, sort: i64) -> RecipeLine {
    RecipeLine {
        id: Uuid::new_v4().to_string(),
        owner_item_id: owner.to_string(),
        reference: RecipeRef::LinkedItem(linked_item_id.to_string()),
        quantity,
        unit: "pc".to_string(),
        is_optional: false,
        selection_group: None,
        sort_order: sort,
    }
}
