//! # Stock Validator
//!
//! Decides whether a cart can be satisfied by current stock.
//!
//! ## Where It Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository::stock_levels(ids)   (read-only, tally-db)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_stock(lines, &levels)  ← THIS MODULE (pure)                     │
//! │       │                                                                 │
//! │       ├── unknown id        → ProductNotFound(id)                      │
//! │       ├── requested > stock → InsufficientStock { .. }                 │
//! │       └── OK                → commit transaction                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are checked in cart order and the first violation wins. Each line is
//! compared against current stock on its own; two lines for the same product
//! are not summed here. The guarded decrement in the commit transaction is
//! what finally rejects such a cart.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::CartLine;

/// Current stock of one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub product_id: i64,
    pub name: String,
    pub stock_quantity: i64,
}

/// Checks one line against the stock level of its product.
pub fn check_line(
    product_id: i64,
    requested: i64,
    level: Option<&StockLevel>,
) -> CoreResult<()> {
    let level = level.ok_or(CoreError::ProductNotFound(product_id))?;

    if requested > level.stock_quantity {
        return Err(CoreError::InsufficientStock {
            product_id,
            name: level.name.clone(),
            available: level.stock_quantity,
            requested,
        });
    }

    Ok(())
}

/// Validates a whole cart against a snapshot of stock levels.
///
/// `levels` is keyed by product id; ids missing from the map are treated as
/// nonexistent products.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use tally_core::money::Money;
/// use tally_core::stock::{check_stock, StockLevel};
/// use tally_core::{CartLine, CoreError};
///
/// let mut levels = HashMap::new();
/// levels.insert(1, StockLevel { product_id: 1, name: "Coffee".into(), stock_quantity: 1 });
///
/// let cart = vec![CartLine {
///     product_id: 1,
///     name: "Coffee".into(),
///     price: Money::from_cents(350),
///     quantity: 2,
/// }];
///
/// let err = check_stock(&cart, &levels).unwrap_err();
/// assert_eq!(err.to_string(), "Not enough stock for Coffee. Only 1 left.");
/// assert!(matches!(err, CoreError::InsufficientStock { available: 1, requested: 2, .. }));
/// ```
pub fn check_stock(lines: &[CartLine], levels: &HashMap<i64, StockLevel>) -> CoreResult<()> {
    for line in lines {
        check_line(line.product_id, line.quantity, levels.get(&line.product_id))?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
