//! # Error Types
//!
//! Domain errors and warnings for mise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mise-core errors (this file)                                          │
//! │  ├── EngineError      - Hard failures (unknown root item, bad input)   │
//! │  ├── EngineWarning    - Degraded-but-continuing conditions, collected  │
//! │  │                      alongside the primary result                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mise-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! The recursive traversals never fail for missing or malformed data *inside*
//! a recipe tree. The offending line is skipped, traversal continues, and an
//! [`EngineWarning`] is appended to the result. Only a top-level "this item
//! does not exist at all" (where the contract demands it) is a hard
//! [`EngineError`]. A single bad recipe line degrades cost accuracy instead
//! of breaking checkout.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, group keys)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Engine Error
// =============================================================================

/// Hard failures of the recipe engine.
///
/// These abort the requested operation. Everything recoverable inside a
/// recipe tree is an [`EngineWarning`] instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The root sellable item of an operation does not exist.
    ///
    /// ## When This Occurs
    /// - `flatten_choices` called with an unknown root id
    /// - `record_sale` called for an item id with no catalog record
    ///
    /// Note that `calculate_cost` deliberately does NOT raise this: a
    /// storefront listing must be able to show "cost unknown" without
    /// crashing, so it returns a zero-cost result flagged `no_recipe`.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A material referenced at the top level does not exist.
    ///
    /// ## When This Occurs
    /// - Price propagation invoked for an unknown material id
    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Engine Warning
// =============================================================================

/// Non-fatal conditions surfaced alongside a traversal result.
///
/// ## Taxonomy
/// ```text
/// CycleDetected / DepthExceeded  → malformed recipe graph (operator error);
///                                  data-integrity signal for administration
/// MissingMaterial / MissingItem  → dangling reference; line skipped
/// ZeroPurchaseQuantity           → division guard; unit cost treated as 0
/// UnresolvedGroup                → mandatory exclusive group had no
///                                  selection at cost/consumption time
/// Oversold                       → a stock decrement took a material below 0
/// ```
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// The recipe graph revisits an item already on the current path.
    /// The repeated branch is not expanded again.
    #[error("Recipe cycle detected at item {item_id}")]
    CycleDetected { item_id: String },

    /// Nesting exceeded the configured maximum depth. Treated as a
    /// configuration error in the recipe data, not a crash.
    #[error("Recipe nesting exceeds {max_depth} levels at item {item_id}")]
    DepthExceeded { item_id: String, max_depth: usize },

    /// A recipe line references a material that does not exist.
    #[error("Recipe line {line_id} references missing material {material_id}")]
    MissingMaterial { line_id: String, material_id: String },

    /// A recipe line references a linked item that does not exist.
    #[error("Recipe line {line_id} references missing item {item_id}")]
    MissingItem { line_id: String, item_id: String },

    /// Material has a non-positive purchase quantity; its unit cost is
    /// treated as zero rather than dividing by zero.
    #[error("Material {material_id} has non-positive purchase quantity; unit cost treated as 0")]
    ZeroPurchaseQuantity { material_id: String },

    /// A mandatory exclusive group had no (or an unrecognised) selection.
    /// Its alternatives contribute no cost; the caller should have resolved
    /// every mandatory group before costing.
    #[error("Mandatory group {group_key} has no resolved selection")]
    UnresolvedGroup { group_key: String },

    /// A stock decrement took a material's on-hand quantity below zero.
    /// Oversell is allowed; checkout never blocks on stock.
    #[error("Material {material_id} oversold: stock now {stock_after}")]
    Oversold { material_id: String, stock_after: f64 },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller-supplied input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
