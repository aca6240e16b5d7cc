//! # Database Handle
//!
//! Opens the SQLite file that backs the product catalog and the cart
//! sessions, and hands out repositories over one shared pool.
//!
//! ## Workload
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Cart Request Against SQLite                     │
//! │                                                                         │
//! │  Database::new(DbConfig::new(path))      once per process              │
//! │       │  pool + WAL + embedded migrations                               │
//! │       ▼                                                                 │
//! │  db.sessions().load_store(&keys)         read  2 cart_sessions rows     │
//! │  stored_item_ids(&store, &keys)          ids of the saved lines         │
//! │  db.products().load_catalog_for(&ids)    read  products WHERE id IN ..  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Cart::open → mutate → cart.save        (no database access)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.sessions().flush_store(&store, &keys) write 2 rows, one transaction │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog reads dominate and sessions are written once per request. WAL
//! lets requests for other sessions read while one session is flushing.

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::session::SessionRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the cart database lives and how the pool is sized.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect. `:memory:` for tests.
    pub database_path: PathBuf,
    /// Default: 5
    pub max_connections: u32,
    /// Apply embedded migrations in [`Database::new`]. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            run_migrations: true,
        }
    }

    /// A private in-memory database. One connection, since every connection
    /// to `:memory:` opens a separate database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared pool plus repository accessors. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects, switches the file to WAL and applies pending migrations.
    ///
    /// ## Errors
    /// * `DbError::ConnectionFailed` - bad path or unopenable file
    /// * `DbError::MigrationFailed` - a cart table migration did not apply
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening cart database");

        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite://{}",
            config.database_path.display()
        ))
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        info!(max_connections = config.max_connections, "Cart database ready");
        Ok(db)
    }

    /// Applies the embedded cart migrations. Already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Catalog rows the cart prices from.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Serialized cart collections, keyed by session key.
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing cart database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
