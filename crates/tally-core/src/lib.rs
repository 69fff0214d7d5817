//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate holds the rules of the store as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Client application (browser)                   │   │
//! │  │    Products ──► Cart ──► Payment ──► Orders ──► Day stats       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-server (axum handlers)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  stock  │ │ period  │ │sequence │  │   │
//! │  │   │ Product │ │  Money  │ │ check_  │ │ Stats-  │ │ next_   │  │   │
//! │  │   │  Sale   │ │         │ │ stock   │ │ Period  │ │order_id │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, commit transaction           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, CartLine, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`stock`] - Stock validator for carts
//! - [`sequence`] - Order id sequence policy
//! - [`period`] - Day-stats periods and calendar windows
//! - [`commit`] - Order commit phases
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{CartLine, Money};
//!
//! let line = CartLine {
//!     product_id: 1,
//!     name: "Coffee".to_string(),
//!     price: Money::from_cents(350),
//!     quantity: 2,
//! };
//! assert_eq!(line.line_total().unwrap().cents(), 700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commit;
pub mod error;
pub mod money;
pub mod period;
pub mod sequence;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use commit::CommitPhase;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{DayStats, DayWindow, StatsPeriod};
pub use stock::StockLevel;
pub use types::*;
