//! # Session Repository
//!
//! Persists the serialized cart collections in `cart_sessions`.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  request start                                                          │
//! │       │  load_store(&keys)      2 rows → MemoryStore                   │
//! │       ▼                                                                 │
//! │  Cart::open(config, catalog, &mut store)                                │
//! │       │  synchronous engine work, no database access                   │
//! │       ▼                                                                 │
//! │  cart.save(&mut store)                                                  │
//! │       │  flush_store(&store, &keys)   one transaction, 2 upserts       │
//! │       ▼                                                                 │
//! │  request end                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cart_core::{MemoryStore, SessionKeys, SessionStore};
use chrono::Utc;
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

const UPSERT: &str = r#"
    INSERT INTO cart_sessions (key, payload, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        payload = excluded.payload,
        updated_at = excluded.updated_at
"#;

/// Repository for cart session payloads.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    pub async fn has(&self, key: &str) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cart_sessions WHERE key = ?1)")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Returns the stored document under `key`.
    pub async fn get(&self, key: &str) -> DbResult<Option<Value>> {
        let payload: Option<String> = sqlx::query_scalar("SELECT payload FROM cart_sessions WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(Into::into)
    }

    /// Inserts or replaces the document under `key`.
    pub async fn put(&self, key: &str, value: &Value) -> DbResult<()> {
        upsert(&self.pool, key, value).await?;
        debug!(key = %key, "Stored session payload");
        Ok(())
    }

    /// Deletes `key`. Returns whether a row was removed.
    pub async fn forget(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cart_sessions WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Loads the cart's two documents into a [`MemoryStore`]. Missing keys
    /// stay missing; `Cart::open` initializes them.
    pub async fn load_store(&self, keys: &SessionKeys) -> DbResult<MemoryStore> {
        let mut store = MemoryStore::new();
        for key in [&keys.items, &keys.conditions] {
            if let Some(value) = self.get(key).await? {
                store.put(key, value)?;
            }
        }

        debug!(items_key = %keys.items, loaded = store.len(), "Loaded cart session");
        Ok(store)
    }

    /// Writes the cart's two documents back in one transaction.
    pub async fn flush_store(&self, store: &MemoryStore, keys: &SessionKeys) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for key in [&keys.items, &keys.conditions] {
            if let Some(value) = store.get(key)? {
                upsert(&mut *tx, key, &value).await?;
            }
        }
        tx.commit().await?;

        debug!(items_key = %keys.items, "Flushed cart session");
        Ok(())
    }
}

async fn upsert<'e, E>(executor: E, key: &str, value: &Value) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(UPSERT)
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .bind(Utc::now())
        .execute(executor)
        .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
