//! # Validation Module
//!
//! Input validation utilities for the recipe engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host application                                             │
//! │  ├── Form-level checks in the admin/catalog UI                         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (engine entry points)                            │
//! │  ├── Quantities positive and finite                                    │
//! │  └── Identifiers present and well formed                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale/recipe quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must be finite (NaN/inf would poison every downstream sum)
pub fn validate_quantity(quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "quantity".to_string(),
        });
    }
    if quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a material's purchase quantity.
///
/// ## Rules
/// - Must be positive: `unit_cost = purchase_cost / purchase_quantity`
///   is undefined otherwise. (Read paths additionally guard the division
///   so legacy rows can't crash a traversal.)
pub fn validate_purchase_quantity(purchase_quantity: f64) -> ValidationResult<()> {
    if !purchase_quantity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "purchase_quantity".to_string(),
        });
    }
    if purchase_quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "purchase_quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount (purchase cost, base price).
///
/// ## Rules
/// - Must be finite
/// - Must be non-negative (zero is allowed: free/promo components)
pub fn validate_money(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    if amount < 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (material or item).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }
    Ok(())
}

/// Validates an opaque external identifier (order id, order line id,
/// external catalog id).
///
/// The engine never interprets these; they only need to be present.
pub fn validate_external_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if id.len() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 100,
        });
    }
    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
