//! # Sale Repository
//!
//! The order ledger, and the order commit engine that writes to it.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit_order(NewOrder)                            │
//! │                                                                         │
//! │  Received                                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Validating   (no writes)                                              │
//! │     ├── cart non-empty, quantities > 0, amounts >= 0                   │
//! │     └── stock_levels(ids) → check_stock()  ── fail ──► RolledBack      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Committing   (one transaction)                                        │
//! │     ├── sales empty? compact sequence                                  │
//! │     ├── INSERT sales header → sale_id                                  │
//! │     └── per line:                                                      │
//! │           INSERT sale_items (price + name snapshot)                    │
//! │           UPDATE products SET stock = stock - q                        │
//! │            WHERE id = ? AND stock >= q     ── 0 rows ──► RolledBack    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Committed → CommitReceipt { order_id, total_amount, order_type }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement means two concurrent commits can never oversell:
//! whichever reaches a product second sees zero rows updated and rolls back.
//!
//! ## Order Ids
//! Sales use an `AUTOINCREMENT` key, so ids freed by deleting orders are never
//! handed out again. Once the ledger is completely empty the counter is reset
//! and numbering restarts at 1. The reset happens on the commit path, never
//! while reading the ledger.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::{begin_write, from_db_timestamp, to_db_timestamp};
use tally_core::sequence::{self, SequenceAction};
use tally_core::stock::{check_line, check_stock, StockLevel};
use tally_core::validation::{validate_amount, validate_new_order};
use tally_core::{
    CommitPhase, CommitReceipt, CoreError, Money, NewOrder, Order, OrderLine, OrderType, Sale,
    SaleItem,
};

const SELECT_SALE: &str = r#"
    SELECT
        id,
        total_cents AS total_amount,
        tax_cents AS tax_amount,
        order_type,
        payment_method,
        date_time
    FROM sales
"#;

/// Sale header as stored; `date_time` is kept as text.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    total_amount: Money,
    tax_amount: Money,
    order_type: OrderType,
    payment_method: Option<String>,
    date_time: String,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let date_time = from_db_timestamp(&row.date_time).ok_or_else(|| {
            DbError::Internal(format!(
                "sale {} has unreadable date_time '{}'",
                row.id, row.date_time
            ))
        })?;

        Ok(Sale {
            id: row.id,
            total_amount: row.total_amount,
            tax_amount: row.tax_amount,
            order_type: row.order_type,
            payment_method: row.payment_method,
            date_time,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Commits a cart as a sale, atomically.
    ///
    /// ## Returns
    /// * `Ok(CommitReceipt)` - Sale, items and stock decrements are all stored
    /// * `Err(DbError::Domain(..))` - Empty cart, invalid line, unknown product
    ///   or short stock; nothing was written
    /// * `Err(..)` - Store failure; the transaction was rolled back
    pub async fn commit_order(&self, order: &NewOrder) -> DbResult<CommitReceipt> {
        let mut phase = CommitPhase::Received;
        advance(&mut phase, CommitPhase::Validating);

        let (levels, expected) = match self.validate_order(order).await {
            Ok(checked) => checked,
            Err(err) => {
                advance(&mut phase, CommitPhase::RolledBack);
                debug!(error = %err, "Order rejected during validation");
                return Err(err);
            }
        };

        if expected != order.total_amount {
            warn!(
                total = %order.total_amount,
                expected = %expected,
                "Order total differs from line sum plus tax"
            );
        }

        advance(&mut phase, CommitPhase::Committing);

        match self.write_order(order, &levels).await {
            Ok(order_id) => {
                advance(&mut phase, CommitPhase::Committed);
                info!(
                    sale_id = order_id,
                    lines = order.lines.len(),
                    total = %order.total_amount,
                    order_type = %order.order_type,
                    "Order committed"
                );
                Ok(CommitReceipt {
                    order_id,
                    total_amount: order.total_amount,
                    order_type: order.order_type,
                })
            }
            Err(err) => {
                advance(&mut phase, CommitPhase::RolledBack);
                warn!(error = %err, "Order commit rolled back");
                Err(err)
            }
        }
    }

    /// Input checks and stock validation. Reads only.
    ///
    /// Returns the stock levels read and the line sum plus tax.
    async fn validate_order(
        &self,
        order: &NewOrder,
    ) -> DbResult<(HashMap<i64, StockLevel>, Money)> {
        if order.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let expected = validate_new_order(order).map_err(CoreError::from)?;

        let ids: Vec<i64> = order.lines.iter().map(|line| line.product_id).collect();
        let levels = ProductRepository::new(self.pool.clone())
            .stock_levels(&ids)
            .await?;

        check_stock(&order.lines, &levels)?;
        Ok((levels, expected))
    }

    /// Runs the write phase in one transaction.
    async fn write_order(
        &self,
        order: &NewOrder,
        levels: &HashMap<i64, StockLevel>,
    ) -> DbResult<i64> {
        let mut tx = begin_write(&self.pool).await?;

        match insert_order(&mut tx, order, levels).await {
            Ok(sale_id) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                Ok(sale_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    // =========================================================================
    // Sequence
    // =========================================================================

    /// Resets the order id counter if, and only if, the ledger is empty.
    ///
    /// Idempotent. Returns `true` if a counter row was removed.
    pub async fn compact_sequence(&self) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        compact_sequence_on(&mut conn).await
    }

    /// Peeks the id the next committed sale will receive.
    ///
    /// Informational only: a concurrent commit can take it first.
    pub async fn next_order_id(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        next_order_id_on(&mut conn).await
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Gets a sale header by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> = sqlx::query_as(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Gets the stored line items of a sale.
    pub async fn items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items: Vec<SaleItem> = sqlx::query_as(
            r#"
            SELECT
                id,
                sale_id,
                product_id,
                quantity,
                price_at_sale_cents AS price_at_sale,
                name_at_sale
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists every order, newest first, with its line items.
    ///
    /// Read-only: never touches the id counter.
    pub async fn list_orders(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<SaleRow> =
            sqlx::query_as(&format!("{SELECT_SALE} ORDER BY date_time DESC, id DESC"))
                .fetch_all(&self.pool)
                .await?;

        let lines: Vec<OrderLine> = sqlx::query_as(
            r#"
            SELECT
                si.sale_id,
                si.product_id,
                si.quantity,
                COALESCE(si.name_at_sale, p.name) AS name,
                si.price_at_sale_cents AS price_at_sale
            FROM sale_items si
            LEFT JOIN products p ON p.id = si.product_id
            ORDER BY si.sale_id, si.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_sale.entry(line.sale_id).or_default().push(line);
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = by_sale.remove(&row.id).unwrap_or_default();
                Sale::try_from(row).map(|sale| Order { sale, items })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Edits the total and order type of a committed sale.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(OrderNotFound))` - No sale with this id
    pub async fn update_order(
        &self,
        id: i64,
        total_amount: Money,
        order_type: OrderType,
    ) -> DbResult<()> {
        validate_amount("total_amount", total_amount).map_err(CoreError::from)?;

        let result = sqlx::query("UPDATE sales SET total_cents = ?2, order_type = ?3 WHERE id = ?1")
            .bind(id)
            .bind(total_amount)
            .bind(order_type)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(id).into());
        }

        info!(sale_id = id, total = %total_amount, order_type = %order_type, "Order updated");
        Ok(())
    }

    /// Deletes a sale and its line items in one transaction.
    ///
    /// Stock is not restored. Deleting an unknown id is not an error.
    ///
    /// ## Returns
    /// `true` if a sale was removed.
    pub async fn delete_order(&self, id: i64) -> DbResult<bool> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let removed = result.rows_affected() > 0;
        info!(sale_id = id, removed, "Order deleted");
        Ok(removed)
    }

    /// Wipes the whole ledger and resets the id counter.
    ///
    /// Maintenance only; not reachable over HTTP.
    ///
    /// ## Returns
    /// Number of sales removed.
    pub async fn delete_all_orders(&self) -> DbResult<u64> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("DELETE FROM sale_items")
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;
        compact_sequence_on(&mut tx).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let removed = result.rows_affected();
        warn!(removed, "All orders deleted");
        Ok(removed)
    }

    /// Counts sales in the ledger.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Logs and applies a commit phase transition.
fn advance(phase: &mut CommitPhase, next: CommitPhase) {
    debug_assert!(phase.can_transition_to(next), "{phase} -> {next}");
    debug!(from = %phase, to = %next, "Commit phase");
    *phase = next;
}

/// Writes header, items and stock decrements. The caller owns the
/// transaction and rolls it back on any error.
async fn insert_order(
    conn: &mut SqliteConnection,
    order: &NewOrder,
    levels: &HashMap<i64, StockLevel>,
) -> DbResult<i64> {
    let sale_count = count_sales_on(conn).await?;
    if sequence::sequence_action(sale_count) == SequenceAction::Reset {
        compact_sequence_on(conn).await?;
    }
    let fallback_id = next_order_id_on(conn).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO sales (total_cents, tax_cents, order_type, payment_method, date_time)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(order.total_amount)
    .bind(order.tax_amount)
    .bind(order.order_type)
    .bind(order.payment_method.as_deref().map(str::trim))
    .bind(to_db_timestamp(&order.date_time))
    .execute(&mut *conn)
    .await?;

    let sale_id = match result.last_insert_rowid() {
        0 => fallback_id,
        id => id,
    };
    debug!(sale_id, "Sale header inserted");

    // Units of each product taken by earlier lines of this cart
    let mut taken: HashMap<i64, i64> = HashMap::new();

    for line in &order.lines {
        let name_at_sale = levels
            .get(&line.product_id)
            .map(|level| level.name.as_str())
            .unwrap_or(line.name.as_str());

        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, price_at_sale_cents, name_at_sale)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.price)
        .bind(name_at_sale)
        .execute(&mut *conn)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - ?2
            WHERE id = ?1 AND stock_quantity >= ?2
            "#,
        )
        .bind(line.product_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

        let already_taken = taken.entry(line.product_id).or_insert(0);
        if updated.rows_affected() == 0 {
            return Err(stock_moved(conn, line.product_id, line.quantity, *already_taken).await);
        }
        *already_taken = already_taken.saturating_add(line.quantity);
    }

    Ok(sale_id)
}

/// Explains a failed guarded decrement by re-reading the product inside the
/// transaction. Quantities are reported as they stood before this cart.
async fn stock_moved(
    conn: &mut SqliteConnection,
    product_id: i64,
    requested: i64,
    already_taken: i64,
) -> DbError {
    let current: Result<Option<StockLevel>, sqlx::Error> = sqlx::query_as(
        "SELECT id AS product_id, name, stock_quantity FROM products WHERE id = ?1",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await;

    match current {
        Ok(Some(mut level)) => {
            level.stock_quantity = level.stock_quantity.saturating_add(already_taken);
            let requested = requested.saturating_add(already_taken);
            match check_line(product_id, requested, Some(&level)) {
                Err(err) => err.into(),
                Ok(()) => CoreError::InsufficientStock {
                    product_id,
                    name: level.name,
                    available: level.stock_quantity,
                    requested,
                }
                .into(),
            }
        }
        Ok(None) => CoreError::ProductNotFound(product_id).into(),
        Err(err) => err.into(),
    }
}

async fn count_sales_on(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

async fn compact_sequence_on(conn: &mut SqliteConnection) -> DbResult<bool> {
    let result = sqlx::query(
        "DELETE FROM sqlite_sequence WHERE name = 'sales' AND NOT EXISTS (SELECT 1 FROM sales)",
    )
    .execute(&mut *conn)
    .await?;

    let reset = result.rows_affected() > 0;
    if reset {
        info!("Order id sequence reset");
    }
    Ok(reset)
}

async fn next_order_id_on(conn: &mut SqliteConnection) -> DbResult<i64> {
    let sale_count = count_sales_on(conn).await?;
    let counter: Option<i64> =
        sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = 'sales'")
            .fetch_optional(&mut *conn)
            .await?;

    Ok(sequence::next_order_id(sale_count, counter))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use tally_core::{CartLine, ValidationError};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().seed_samples().await.unwrap();
        db
    }

    fn order(lines: &[(i64, i64)]) -> NewOrder {
        let lines: Vec<CartLine> = lines
            .iter()
            .map(|&(product_id, quantity)| CartLine {
                product_id,
                name: format!("item {product_id}"),
                price: Money::from_cents(350),
                quantity,
            })
            .collect();
        let total: Money = lines.iter().filter_map(CartLine::line_total).sum();
        NewOrder {
            lines,
            total_amount: total,
            tax_amount: Money::zero(),
            order_type: OrderType::DineIn,
            payment_method: None,
            date_time: Utc::now(),
        }
    }

    async fn stock(db: &Database, id: i64) -> i64 {
        db.products().get(id).await.unwrap().unwrap().stock_quantity
    }

    async fn item_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_decrements_stock() {
        let db = seeded().await;

        let receipt = db.sales().commit_order(&order(&[(1, 2)])).await.unwrap();
        assert_eq!(receipt.order_id, 1);
        assert_eq!(receipt.total_amount.cents(), 700);
        assert_eq!(receipt.order_type, OrderType::DineIn);

        assert_eq!(stock(&db, 1).await, 8);

        let items = db.sales().items(1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_at_sale.cents(), 350);
        assert_eq!(items[0].name_at_sale.as_deref(), Some("Coffee"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let db = seeded().await;
        sqlx::query("UPDATE products SET stock_quantity = 1 WHERE id = 1")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.sales().commit_order(&order(&[(1, 2)])).await.unwrap_err();
        assert_eq!(err.to_string(), "Not enough stock for Coffee. Only 1 left.");

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_count(&db).await, 0);
        assert_eq!(stock(&db, 1).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = seeded().await;
        let err = db.sales().commit_order(&order(&[(42, 1)])).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&CoreError::ProductNotFound(42)));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_any_failing_line_blocks_whole_cart() {
        let db = seeded().await;

        // Coffee is fine, Sandwich has no stock
        let err = db
            .sales()
            .commit_order(&order(&[(1, 1), (3, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { product_id: 3, .. })
        ));
        assert_eq!(stock(&db, 1).await, 10);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let db = seeded().await;
        let err = db.sales().commit_order(&order(&[])).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&CoreError::EmptyCart));
    }

    #[tokio::test]
    async fn test_duplicate_lines_cannot_oversell() {
        let db = seeded().await;

        // Croissant has 5; each line fits alone, together they do not
        let err = db
            .sales()
            .commit_order(&order(&[(2, 3), (2, 3)]))
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&CoreError::InsufficientStock {
                product_id: 2,
                name: "Croissant".to_string(),
                available: 5,
                requested: 6,
            })
        );

        assert_eq!(stock(&db, 2).await, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_overflowing_line_total_is_rejected() {
        let db = seeded().await;
        sqlx::query("UPDATE products SET stock_quantity = 100000000 WHERE id = 1")
            .execute(db.pool())
            .await
            .unwrap();

        let mut big = order(&[(1, 100_000_000)]);
        big.lines[0].price = Money::from_cents(900_000_000_000_000);
        big.total_amount = Money::from_cents(1);

        let err = db.sales().commit_order(&big).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { field, .. }))
                if field == "quantity"
        ));

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_count(&db).await, 0);
        assert_eq!(stock(&db, 1).await, 100_000_000);
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back() {
        let db = seeded().await;
        sqlx::query(
            "CREATE TRIGGER fail_items BEFORE INSERT ON sale_items \
             BEGIN SELECT RAISE(ABORT, 'sale_items unavailable'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sales().commit_order(&order(&[(1, 2)])).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(ref msg) if msg.contains("sale_items unavailable")));

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_count(&db).await, 0);
        assert_eq!(stock(&db, 1).await, 10);
    }

    #[tokio::test]
    async fn test_ids_stay_monotonic_after_deletes() {
        let db = seeded().await;
        for _ in 0..3 {
            db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        }
        db.sales().delete_order(2).await.unwrap();
        db.sales().delete_order(3).await.unwrap();

        assert_eq!(db.sales().next_order_id().await.unwrap(), 4);
        let receipt = db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        assert_eq!(receipt.order_id, 4);
    }

    #[tokio::test]
    async fn test_ids_restart_when_ledger_emptied() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        db.sales().delete_order(1).await.unwrap();
        db.sales().delete_order(2).await.unwrap();

        // Listing is read-only: the counter row survives
        assert!(db.sales().list_orders().await.unwrap().is_empty());
        let counter: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = 'sales'")
                .fetch_optional(db.pool())
                .await
                .unwrap();
        assert_eq!(counter, Some(2));

        assert_eq!(db.sales().next_order_id().await.unwrap(), 1);
        let receipt = db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        assert_eq!(receipt.order_id, 1);
    }

    #[tokio::test]
    async fn test_compact_sequence_only_when_empty() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        assert!(!db.sales().compact_sequence().await.unwrap());

        db.sales().delete_order(1).await.unwrap();
        assert!(db.sales().compact_sequence().await.unwrap());
        assert!(!db.sales().compact_sequence().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_orders() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        db.sales().commit_order(&order(&[(2, 1)])).await.unwrap();

        assert_eq!(db.sales().delete_all_orders().await.unwrap(), 2);
        assert_eq!(item_count(&db).await, 0);

        let receipt = db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();
        assert_eq!(receipt.order_id, 1);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_snapshots() {
        let db = seeded().await;

        let mut older = order(&[(1, 1)]);
        older.date_time = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        older.payment_method = Some("cash".to_string());
        db.sales().commit_order(&older).await.unwrap();

        let mut newer = order(&[(2, 2), (1, 1)]);
        newer.date_time = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        newer.order_type = OrderType::TakeOut;
        db.sales().commit_order(&newer).await.unwrap();

        // Deleted product still shows its name on old orders
        db.products().delete(2).await.unwrap();

        let orders = db.sales().list_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].sale.id, 2);
        assert_eq!(orders[0].sale.order_type, OrderType::TakeOut);
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].items[0].name.as_deref(), Some("Croissant"));
        assert_eq!(orders[0].items[0].quantity, 2);

        assert_eq!(orders[1].sale.payment_method.as_deref(), Some("cash"));
        assert_eq!(orders[1].sale.date_time, older.date_time);
    }

    #[tokio::test]
    async fn test_update_order() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 1)])).await.unwrap();

        db.sales()
            .update_order(1, Money::from_cents(999), OrderType::TakeOut)
            .await
            .unwrap();
        let sale = db.sales().get(1).await.unwrap().unwrap();
        assert_eq!(sale.total_amount.cents(), 999);
        assert_eq!(sale.order_type, OrderType::TakeOut);

        let err = db
            .sales()
            .update_order(77, Money::zero(), OrderType::DineIn)
            .await
            .unwrap_err();
        assert_eq!(err.as_domain(), Some(&CoreError::OrderNotFound(77)));
    }

    #[tokio::test]
    async fn test_delete_order_keeps_stock_and_tolerates_unknown_id() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 4)])).await.unwrap();

        assert!(db.sales().delete_order(1).await.unwrap());
        assert!(!db.sales().delete_order(1).await.unwrap());
        assert_eq!(item_count(&db).await, 0);
        assert_eq!(stock(&db, 1).await, 6);
    }

    #[tokio::test]
    async fn test_stock_conservation() {
        let db = seeded().await;
        db.sales().commit_order(&order(&[(1, 2), (2, 1)])).await.unwrap();
        db.sales().commit_order(&order(&[(1, 3)])).await.unwrap();
        // Rejected commit changes nothing
        let _ = db.sales().commit_order(&order(&[(1, 6)])).await.unwrap_err();

        let sold: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM sale_items WHERE product_id = 1")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(sold, 5);
        assert_eq!(stock(&db, 1).await, 10 - sold);
    }

    async fn file_backed(dir: &tempfile::TempDir) -> Database {
        let config = DbConfig::new(dir.path().join("tally.db")).max_connections(8);
        let db = Database::new(config).await.unwrap();
        db.products().seed_samples().await.unwrap();
        db
    }

    async fn commit_concurrently(
        db: &Database,
        commits: usize,
    ) -> Vec<DbResult<CommitReceipt>> {
        let handles: Vec<_> = (0..commits)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.sales().commit_order(&order(&[(1, 1)])).await })
            })
            .collect();

        let mut results = Vec::with_capacity(commits);
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_backed(&dir).await;
        sqlx::query("UPDATE products SET stock_quantity = 1000 WHERE id = 1")
            .execute(db.pool())
            .await
            .unwrap();

        let results = commit_concurrently(&db, 16).await;

        let mut ids: Vec<i64> = results
            .into_iter()
            .map(|result| result.unwrap().order_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);

        assert_eq!(stock(&db, 1).await, 984);
        assert_eq!(db.sales().count().await.unwrap(), 16);
        assert_eq!(item_count(&db).await, 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_backed(&dir).await;
        sqlx::query("UPDATE products SET stock_quantity = 5 WHERE id = 1")
            .execute(db.pool())
            .await
            .unwrap();

        let results = commit_concurrently(&db, 12).await;

        let committed = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(committed, 5);
        for err in results.iter().filter_map(|result| result.as_ref().err()) {
            assert!(matches!(
                err.as_domain(),
                Some(CoreError::InsufficientStock { product_id: 1, .. })
            ));
        }

        assert_eq!(stock(&db, 1).await, 0);
        assert_eq!(db.sales().count().await.unwrap(), 5);
    }
}
