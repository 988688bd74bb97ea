//! # mise-core: Pure Recipe & COGS Logic for Mise POS
//!
//! This crate is the **heart** of the recipe composition and cost-of-goods
//! engine. It contains the three recursive traversals as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Mise POS Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Host application (storefront, order lifecycle)        │   │
//! │  │    menu display ──► choice UI ──► checkout ──► reporting       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mise-db (CogsEngine)                         │   │
//! │  │    loads Catalog snapshots, applies consumption in one tx      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mise-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │ resolver  │  │  rollup   │  │consumption │  │propagation│ │   │
//! │  │   │ flatten   │  │ cost +    │  │ planned    │  │ leaves-   │ │   │
//! │  │   │ choices   │  │ breakdown │  │ stock draws│  │ first ord │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Material, SellableItem, RecipeLine, ...)
//! - [`catalog`] - In-memory recipe graph snapshot the traversals run over
//! - [`resolver`] - Choice flattening: surface every buyer choice at one level
//! - [`rollup`] - Cost rollup: total + per-leaf breakdown
//! - [`consumption`] - Consumption planning: stock draws mirroring the rollup
//! - [`propagation`] - Leaves-first ordering for cached-cost refresh
//! - [`error`] - Typed errors and the warning taxonomy
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every traversal is deterministic over a Catalog
//!    snapshot - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Degrade, don't throw**: malformed data inside a recipe tree becomes
//!    a warning on the result, never a panic or a hard error
//! 4. **Guarded recursion**: max depth + on-path visited set make operator
//!    mistakes (cycles) a data-integrity warning instead of a stack overflow
//!
//! ## Example Usage
//!
//! ```rust
//! use mise_core::{calculate_cost, flatten_choices, BundleSelection, Catalog};
//!
//! let catalog = Catalog::new(); // normally loaded by mise-db
//!
//! // Unknown items quote as "cost unknown", they never crash a menu list.
//! let cost = calculate_cost(&catalog, "some-item", 1.0, None);
//! assert!(cost.no_recipe);
//! assert_eq!(cost.total_cost, 0.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod consumption;
pub mod error;
pub mod propagation;
pub mod resolver;
pub mod rollup;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mise_core::Catalog` instead of
// `use mise_core::catalog::Catalog`

pub use catalog::Catalog;
pub use consumption::plan_consumption;
pub use error::{EngineError, EngineResult, EngineWarning, ValidationError};
pub use propagation::affected_items;
pub use resolver::flatten_choices;
pub use rollup::calculate_cost;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum recipe nesting depth any traversal will follow.
///
/// Real menus nest two or three levels (combo → drink → materials);
/// anything past this bound is treated as a recipe-data configuration
/// error and surfaced as [`EngineWarning::DepthExceeded`].
pub const MAX_RECIPE_DEPTH: usize = 16;
