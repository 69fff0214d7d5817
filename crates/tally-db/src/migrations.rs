//! # Database Migrations
//!
//! Embedded SQL migrations for Tally POS, plus an additive column backfill.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Schema Upgrade Process                             │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MIGRATOR.run()                                                        │
//! │       │  Compare embedded migrations vs _sqlx_migrations               │
//! │       │  └── 0001_initial_schema.sql                                   │
//! │       ▼                                                                 │
//! │  ensure_additive_columns()                                             │
//! │       │  PRAGMA table_info(<table>)                                    │
//! │       │  ├── column present? skip                                      │
//! │       │  └── column missing? ALTER TABLE ... ADD COLUMN ... DEFAULT    │
//! │       ▼                                                                 │
//! │  App continues startup                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backfill brings database files created before a column existed up to
//! date. It only ever adds columns; it never drops or rewrites data.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Columns added after the first release: `(table, column, definition)`.
const ADDITIVE_COLUMNS: &[(&str, &str, &str)] = &[
    ("products", "stock_quantity", "INTEGER NOT NULL DEFAULT 0"),
    ("sales", "order_type", "TEXT NOT NULL DEFAULT 'dine-in'"),
    ("sales", "payment_method", "TEXT"),
    ("sale_items", "name_at_sale", "TEXT"),
];

/// Runs all pending database migrations, then the column backfill.
///
/// Idempotent: safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;
    ensure_additive_columns(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Adds any missing column from [`ADDITIVE_COLUMNS`].
///
/// ## Returns
/// Number of columns added.
pub async fn ensure_additive_columns(pool: &SqlitePool) -> DbResult<usize> {
    let mut added = 0;

    for (table, column, definition) in ADDITIVE_COLUMNS {
        let existing: Vec<String> =
            sqlx::query_scalar(&format!("SELECT name FROM pragma_table_info('{table}')"))
                .fetch_all(pool)
                .await?;

        if existing.is_empty() {
            // Table not created yet; migrations own table creation
            continue;
        }

        if existing.iter().any(|name| name == column) {
            continue;
        }

        info!(table = %table, column = %column, "Adding missing column");
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
            .execute(pool)
            .await?;
        added += 1;
    }

    Ok(added)
}
