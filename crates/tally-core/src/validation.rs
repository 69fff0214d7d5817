//! # Validation Module
//!
//! Input validation utilities for Tally POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (tally-server)                                  │
//! │  ├── JSON shape, numeric strings, decimal → cents                      │
//! │  └── Missing required fields                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (lengths, signs, formats)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (sku)                                                      │
//! │  └── Foreign key (sale_items.sale_id)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("CF-001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, NewOrder, ProductInput};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted.
pub const MAX_NAME_LEN: usize = 200;

/// Longest SKU accepted.
pub const MAX_SKU_LEN: usize = 50;

/// Longest payment method label accepted.
pub const MAX_PAYMENT_LABEL_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty (absent SKUs are represented as `None`, not `""`)
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_sku;
///
/// assert!(validate_sku("CF-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a payment method label (`cash`, `card`, ...).
pub fn validate_payment_method(label: &str) -> ValidationResult<()> {
    if label.trim().chars().count() > MAX_PAYMENT_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: MAX_PAYMENT_LABEL_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout                                                               │
/// │                                                                         │
/// │  Cart line: Coffee × 0                                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → 400 "quantity must be positive"                  │
/// │       │                                                                 │
/// │       └── OK → stock check                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a units-on-hand value.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock_quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a non-negative monetary amount.
///
/// Zero is allowed (free items, untaxed orders).
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::validation::validate_amount;
///
/// assert!(validate_amount("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_amount("price", Money::zero()).is_ok());
/// assert!(validate_amount("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a catalog entry before create or update.
///
/// A blank SKU counts as no SKU.
pub fn validate_product_input(input: &ProductInput) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    validate_amount("price", input.price)?;
    if let Some(sku) = input.sku.as_deref().filter(|s| !s.trim().is_empty()) {
        validate_sku(sku)?;
    }
    validate_stock_quantity(input.stock_quantity)?;
    Ok(())
}

/// Validates the shape of each cart line.
///
/// A line whose total does not fit in `i64` cents is rejected on its
/// quantity. Emptiness is a separate business rule (`CoreError::EmptyCart`)
/// and is not checked here.
pub fn validate_cart_lines(lines: &[CartLine]) -> ValidationResult<()> {
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_amount("price", line.price)?;
        if line.line_total().is_none() {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX / line.price.cents().max(1),
            });
        }
    }
    Ok(())
}

/// Validates the lines and amounts of an order about to be committed.
///
/// ## Returns
/// The line sum plus tax, for comparison with the caller's total.
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<Money> {
    validate_cart_lines(&order.lines)?;
    validate_amount("total_amount", order.total_amount)?;
    validate_amount("tax_amount", order.tax_amount)?;
    if let Some(method) = &order.payment_method {
        validate_payment_method(method)?;
    }

    order
        .expected_total()
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total_amount".to_string(),
            min: 0,
            max: i64::MAX,
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
