//! # Product Repository
//!
//! The product table is the catalog cart items are priced from.
//!
//! ## Catalog Snapshot
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Async DB → Sync Engine                               │
//! │                                                                         │
//! │  cart-core's Catalog trait is synchronous. Per request:                │
//! │                                                                         │
//! │  ids = stored_item_ids(&store, &keys)                                   │
//! │  db.products().load_catalog_for(&ids).await  (the cart's own lines)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MemoryCatalog<ProductRecord>  ──► Cart::open(config, catalog, store)  │
//! │                                                                         │
//! │  A request that may add products not yet in the cart needs their rows  │
//! │  too: load them by id alongside, or take the whole snapshot with       │
//! │  load_catalog() when the product table is small.                       │
//! │                                                                         │
//! │  Inactive products are not part of the catalog; a cart line pointing   │
//! │  at one fails pricing with ModelNotFound.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

use cart_core::{CartModel, ItemId, MemoryCatalog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, price, is_active, created_at, updated_at";

/// A product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// The cart item id this product is addressed by.
    pub fn item_id(&self) -> DbResult<ItemId> {
        u64::try_from(self.id)
            .ok()
            .and_then(|raw| ItemId::new(raw).ok())
            .ok_or_else(|| DbError::Internal(format!("Invalid product id in database: {}", self.id)))
    }
}

impl CartModel for ProductRecord {
    fn cart_price(&self) -> f64 {
        self.price
    }
}

/// Fields needed to create a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns the stored row.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - a product with this id exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<ProductRecord> {
        let now = Utc::now();
        let id = db_id(product.id)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ProductRecord {
            id,
            name: product.name.clone(),
            price: product.price,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by id, active or not.
    pub async fn get_by_id(&self, id: ItemId) -> DbResult<Option<ProductRecord>> {
        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(db_id(id)?)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Fetches active products by id in one query.
    ///
    /// Unknown and inactive ids are absent from the result. An empty id set
    /// returns an empty map without touching the database.
    pub async fn fetch_by_ids(&self, ids: &BTreeSet<ItemId>) -> DbResult<HashMap<ItemId, ProductRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 AND id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(db_id(*id)?);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProductRecord> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = rows.len(), "Fetched products by id");
        keyed(rows)
    }

    /// Loads every active product into an in-memory catalog.
    ///
    /// For requests that add arbitrary products; prefer
    /// [`load_catalog_for`](Self::load_catalog_for) when the id set is known.
    pub async fn load_catalog(&self) -> DbResult<MemoryCatalog<ProductRecord>> {
        let rows = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded product catalog");
        Ok(keyed(rows)?.into_iter().collect())
    }

    /// Loads only the given products into an in-memory catalog. This is the
    /// per-request path: `ids` are the restored cart's lines plus any
    /// products the request is about to add.
    pub async fn load_catalog_for(&self, ids: &BTreeSet<ItemId>) -> DbResult<MemoryCatalog<ProductRecord>> {
        Ok(self.fetch_by_ids(ids).await?.into_iter().collect())
    }

    /// Marks a product inactive. It stays in the table but leaves the catalog.
    pub async fn deactivate(&self, id: ItemId) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(db_id(id)?)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.to_string()));
        }

        debug!(id = %id, "Deactivated product");
        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn db_id(id: ItemId) -> DbResult<i64> {
    i64::try_from(id.get()).map_err(|_| DbError::Internal(format!("Item id {id} exceeds SQLite INTEGER range")))
}

fn keyed(rows: Vec<ProductRecord>) -> DbResult<HashMap<ItemId, ProductRecord>> {
    rows.into_iter()
        .map(|row| -> DbResult<(ItemId, ProductRecord)> { Ok((row.item_id()?, row)) })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use cart_core::Catalog;

    use super::*;
    use crate::pool::{Database, DbConfig};

    fn id(raw: u64) -> ItemId {
        ItemId::new(raw).unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (raw, price) in [(1, 5.24), (2, 10.48), (3, 15.72)] {
            db.products()
                .insert(&NewProduct {
                    id: id(raw),
                    name: format!("Product {raw}"),
                    price,
                })
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = seeded().await;

        let product = db.products().get_by_id(id(2)).await.unwrap().unwrap();
        assert_eq!(product.name, "Product 2");
        assert_eq!(product.cart_price(), 10.48);
        assert!(product.is_active);

        assert!(db.products().get_by_id(id(99)).await.unwrap().is_none());
        assert_eq!(db.products().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_unique_violation() {
        let db = seeded().await;
        let err = db
            .products()
            .insert(&NewProduct {
                id: id(1),
                name: "Again".to_string(),
                price: 1.0,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_fetch_by_ids_skips_unknown_and_inactive() {
        let db = seeded().await;
        db.products().deactivate(id(3)).await.unwrap();

        let ids: BTreeSet<_> = [id(1), id(3), id(42)].into();
        let found = db.products().fetch_by_ids(&ids).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[&id(1)].price, 5.24);
        assert!(db.products().fetch_by_ids(&BTreeSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_missing_is_not_found() {
        let db = seeded().await;
        let err = db.products().deactivate(id(77)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_loaded_catalog_implements_core_catalog() {
        let db = seeded().await;
        let catalog = db.products().load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 3);

        let models = catalog.fetch_by_ids(&[id(1), id(2)].into()).unwrap();
        assert_eq!(models[&id(2)].cart_price(), 10.48);

        let partial = db.products().load_catalog_for(&[id(3)].into()).await.unwrap();
        assert_eq!(partial.len(), 1);
    }
}
