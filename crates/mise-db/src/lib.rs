//! # mise-db: Database Layer for Mise POS
//!
//! SQLite-backed storage and the database-facing surface of the recipe
//! composition & COGS engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          mise-db                                        │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────────────────────────────────┐    │
//! │  │   Database   │  │                CogsEngine                     │    │
//! │  │  (pool mgmt, │  │  flatten / cost quotes (read-only snapshots) │    │
//! │  │  migrations) │  │  record_sale (the one writer, one tx)        │    │
//! │  └──────┬───────┘  │  price propagation (leaves-first refresh)    │    │
//! │         │          └──────────────────┬───────────────────────────┘    │
//! │         │                             │                                 │
//! │  ┌──────▼─────────────────────────────▼───────────────────────────┐    │
//! │  │                      Repositories                               │    │
//! │  │  materials ─ items ─ recipe_lines ─ consumption_records        │    │
//! │  └────────────────────────────┬───────────────────────────────────┘    │
//! │                               │                                         │
//! │                        SQLite (WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use mise_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./mise.db")).await?;
//!
//! let choices = db.engine().flatten_choices("item-id").await?;
//! let quote = db.engine().calculate_cost("item-id", 2.0, None).await?;
//! let sale = db.engine()
//!     .record_sale("ord-1", "line-1", "item-id", 2.0, None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{CogsEngine, RecordedSale, RefreshedCost};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    ConsumptionRepository, ItemRepository, MaterialRepository, RecipeRepository,
};
