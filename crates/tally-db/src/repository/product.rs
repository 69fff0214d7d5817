//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD operations (hard delete; sale history keeps name snapshots)
//! - Stock level reads for the stock validator
//! - Sample catalog seeding
//!
//! ## Who Changes Stock?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Writers                                        │
//! │                                                                         │
//! │  Catalog edit (PUT /api/products/:id)                                  │
//! │     UPDATE products SET stock_quantity = 12        ← absolute          │
//! │                                                                         │
//! │  Committed sale (SaleRepository::commit_order)                         │
//! │     UPDATE products                                                    │
//! │        SET stock_quantity = stock_quantity - 2     ← guarded delta     │
//! │      WHERE id = ? AND stock_quantity >= 2                              │
//! │                                                                         │
//! │  Nothing else writes stock. Deleting an order does not restore it.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tally_core::stock::StockLevel;
use tally_core::validation::validate_product_input;
use tally_core::{CoreError, Money, Product, ProductInput};

/// Sample catalog for a fresh install: `(name, price_cents, sku, stock)`.
pub const SAMPLE_PRODUCTS: &[(&str, i64, &str, i64)] = &[
    ("Coffee", 350, "CF-001", 10),
    ("Croissant", 275, "CR-002", 5),
    ("Sandwich", 899, "SW-003", 0),
];

const SELECT_PRODUCT: &str = r#"
    SELECT
        id,
        name,
        price_cents AS price,
        sku,
        stock_quantity
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let all = repo.list().await?;
/// let coffee = repo.get(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products: Vec<Product> = sqlx::query_as(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product: Option<Product> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::Domain(Validation))` - Input rejected before any write
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, input: &ProductInput) -> DbResult<Product> {
        validate_product_input(input).map_err(CoreError::from)?;

        let name = input.name.trim();
        let sku = normalized_sku(input);
        debug!(name = %name, sku = ?sku, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price_cents, sku, stock_quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(name)
        .bind(input.price)
        .bind(sku)
        .bind(input.stock_quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, sku))?;

        let product = Product {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            price: input.price,
            sku: sku.map(str::to_string),
            stock_quantity: input.stock_quantity,
        };

        info!(id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Replaces all editable fields of a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product as now stored
    /// * `Err(DbError::Domain(ProductNotFound))` - No product with this id
    /// * `Err(DbError::UniqueViolation)` - SKU belongs to another product
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        validate_product_input(input).map_err(CoreError::from)?;

        let name = input.name.trim();
        let sku = normalized_sku(input);
        debug!(id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                sku = ?4,
                stock_quantity = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(input.price)
        .bind(sku)
        .bind(input.stock_quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, sku))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id).into());
        }

        Ok(Product {
            id,
            name: name.to_string(),
            price: input.price,
            sku: sku.map(str::to_string),
            stock_quantity: input.stock_quantity,
        })
    }

    /// Hard-deletes a product.
    ///
    /// Deleting an unknown id is not an error.
    ///
    /// ## Returns
    /// `true` if a row was removed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        debug!(id, removed, "Deleted product");
        Ok(removed)
    }

    /// Loads current stock for the given product ids.
    ///
    /// Ids with no product are simply absent from the map.
    pub async fn stock_levels(&self, ids: &[i64]) -> DbResult<HashMap<i64, StockLevel>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id AS product_id, name, stock_quantity FROM products WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let levels: Vec<StockLevel> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(levels.into_iter().map(|l| (l.product_id, l)).collect())
    }

    /// Inserts the sample catalog, skipping SKUs that already exist.
    ///
    /// ## Returns
    /// Number of products inserted.
    pub async fn seed_samples(&self) -> DbResult<u64> {
        let mut inserted = 0;

        for (name, price_cents, sku, stock) in SAMPLE_PRODUCTS {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO products (name, price_cents, sku, stock_quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(*name)
            .bind(Money::from_cents(*price_cents))
            .bind(*sku)
            .bind(*stock)
            .execute(&self.pool)
            .await?;

            inserted += result.rows_affected();
        }

        info!(inserted, "Sample catalog seeded");
        Ok(inserted)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Trimmed SKU, with blank treated as absent.
fn normalized_sku(input: &ProductInput) -> Option<&str> {
    input
        .sku
        .as_deref()
        .map(str::trim)
        .filter(|sku| !sku.is_empty())
}

/// Names the SKU in unique violations; other errors pass through.
fn sku_conflict(err: sqlx::Error, sku: Option<&str>) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku.unwrap_or_default()),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tally_core::ValidationError;

    async fn repo() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn input(name: &str, cents: i64, sku: Option<&str>, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price: Money::from_cents(cents),
            sku: sku.map(str::to_string),
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;
        let created = repo.create(&input("Tea", 250, Some("TE-010"), 4)).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.price.cents(), 250);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let repo = repo().await;
        let err = repo.create(&input("  ", 250, None, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_conflict() {
        let repo = repo().await;
        repo.create(&input("Coffee", 350, Some("CF-001"), 1)).await.unwrap();

        let err = repo
            .create(&input("Other coffee", 300, Some("CF-001"), 1))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "CF-001");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_products_without_sku_do_not_conflict() {
        let repo = repo().await;
        repo.create(&input("Water", 100, None, 1)).await.unwrap();
        repo.create(&input("Juice", 200, Some(""), 1)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let repo = repo().await;
        let created = repo.create(&input("Coffee", 350, Some("CF-001"), 10)).await.unwrap();

        let updated = repo
            .update(created.id, &input("Large coffee", 450, Some("CF-001L"), 12))
            .await
            .unwrap();
        assert_eq!(updated.name, "Large coffee");

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let repo = repo().await;
        let err = repo.update(404, &input("Ghost", 1, None, 0)).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&CoreError::ProductNotFound(404)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repo().await;
        let created = repo.create(&input("Muffin", 300, None, 2)).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = repo().await;
        let first = repo.create(&input("A", 100, None, 0)).await.unwrap();
        repo.delete(first.id).await.unwrap();
        let second = repo.create(&input("B", 100, None, 0)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_seed_samples_once() {
        let repo = repo().await;
        assert_eq!(repo.seed_samples().await.unwrap(), 3);
        assert_eq!(repo.seed_samples().await.unwrap(), 0);

        let products = repo.list().await.unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Croissant", "Sandwich"]);
        assert_eq!(products[2].stock_quantity, 0);
        assert_eq!(products[2].price.cents(), 899);
    }

    #[tokio::test]
    async fn test_stock_levels_skip_unknown_ids() {
        let repo = repo().await;
        repo.seed_samples().await.unwrap();

        let levels = repo.stock_levels(&[1, 2, 99]).await.unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[&1].stock_quantity, 10);
        assert_eq!(levels[&2].name, "Croissant");
        assert!(!levels.contains_key(&99));
    }
}
