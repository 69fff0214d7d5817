//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().commit_order(order)                                │
//! │       ▼                                                                 │
//! │  ProductRepository          SaleRepository         StatsRepository     │
//! │  ├── list / get             ├── commit_order       └── day_stats       │
//! │  ├── create / update        ├── list_orders                            │
//! │  ├── delete                 ├── update_order                           │
//! │  ├── stock_levels           ├── delete_order                           │
//! │  └── seed_samples           └── compact_sequence                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and stock levels
//! - [`SaleRepository`](sale::SaleRepository) - Order commit and ledger management
//! - [`StatsRepository`](stats::StatsRepository) - Day stats aggregation

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{DbError, DbResult};

pub mod product;
pub mod sale;
pub mod stats;

/// Storage format of `sales.date_time` (UTC, second precision).
///
/// Fixed-width, so string comparison orders the same as time.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a UTC instant for storage or range comparison.
pub fn to_db_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored timestamp back into UTC.
pub fn from_db_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, DB_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Opens a write transaction holding SQLite's write lock from its first
/// statement.
///
/// A deferred `BEGIN` takes the lock on the first write, after the reads, and
/// SQLite fails a busy read-to-write upgrade at once instead of waiting out
/// `busy_timeout`. `BEGIN IMMEDIATE` waits at the start instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}
