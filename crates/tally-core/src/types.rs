//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (INTEGER)   │   │  id (sequence)  │   │  sale_id (FK)   │       │
//! │  │  name           │   │  total_amount   │   │  product_id     │       │
//! │  │  price          │   │  tax_amount     │   │  quantity       │       │
//! │  │  sku?           │   │  order_type     │   │  price_at_sale  │       │
//! │  │  stock_quantity │   │  date_time      │   │  name_at_sale   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │──►│    NewOrder     │──►│  CommitReceipt  │       │
//! │  │  (proposed)     │   │  (to commit)    │   │  (committed)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleItem` freezes the unit price and product name at commit time, so
//! editing or deleting a product never rewrites order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier, never reused.
    pub id: i64,

    /// Display name shown to cashier and on orders.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Stock Keeping Unit. Unique when present.
    pub sku: Option<String>,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,
}

impl Product {
    /// Checks if `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.stock_quantity
    }
}

/// Fields of a product as supplied by catalog management.
///
/// Used for both create and full-replace update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub price: Money,
    pub sku: Option<String>,
    pub stock_quantity: i64,
}

// =============================================================================
// Order Type
// =============================================================================

/// How the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum OrderType {
    /// Eaten on the premises.
    #[default]
    DineIn,
    /// Packed to go.
    TakeOut,
}

impl OrderType {
    /// The wire/storage label (`dine-in`, `take-out`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::TakeOut => "take-out",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ValidationError;

    /// Parses an order type, tolerating the spellings older clients send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dine-in" | "dine_in" | "dinein" => Ok(OrderType::DineIn),
            "take-out" | "take_out" | "takeout" | "takeaway" => Ok(OrderType::TakeOut),
            _ => Err(ValidationError::NotAllowed {
                field: "order_type".to_string(),
                allowed: vec!["dine-in".to_string(), "take-out".to_string()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    /// Caller-supplied order total.
    pub total_amount: Money,
    /// Caller-supplied tax portion.
    pub tax_amount: Money,
    pub order_type: OrderType,
    /// Payment label (`cash`, `card`, ...). Recorded, never processed.
    pub payment_method: Option<String>,
    /// When the order was committed. Immutable.
    #[ts(as = "String")]
    pub date_time: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    /// Weak reference; the product may since have been deleted.
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub price_at_sale: Money,
    /// Product name at time of sale (frozen). `None` on rows written
    /// before the snapshot column existed.
    pub name_at_sale: Option<String>,
}

/// A line item as shown in the order list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Snapshot name, falling back to the current catalog name.
    pub name: Option<String>,
    pub price_at_sale: Money,
}

/// A sale with its nested line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub sale: Sale,
    pub items: Vec<OrderLine>,
}

// =============================================================================
// Checkout
// =============================================================================

/// One proposed line of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: i64,
    /// Name as displayed in the cart. Informational only.
    pub name: String,
    /// Unit price the customer was quoted; stored as `price_at_sale`.
    pub price: Money,
    pub quantity: i64,
}

impl CartLine {
    /// Returns the quoted line total, or `None` if it does not fit in
    /// an `i64` of cents.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_multiply_quantity(self.quantity)
    }
}

/// A cart ready to be committed as a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub lines: Vec<CartLine>,
    pub total_amount: Money,
    pub tax_amount: Money,
    pub order_type: OrderType,
    pub payment_method: Option<String>,
    #[ts(as = "String")]
    pub date_time: DateTime<Utc>,
}

impl NewOrder {
    /// Sum of quoted line totals plus tax, or `None` on overflow.
    ///
    /// The caller's `total_amount` is authoritative; this is only used to
    /// flag mismatches.
    pub fn expected_total(&self) -> Option<Money> {
        self.lines
            .iter()
            .try_fold(self.tax_amount, |sum, line| sum.checked_add(line.line_total()?))
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitReceipt {
    pub order_id: i64,
    pub total_amount: Money,
    pub order_type: OrderType,
}

// =============================================================================
// Unit Tests
// =============================================================================
