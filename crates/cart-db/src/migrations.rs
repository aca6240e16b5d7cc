//! # Cart Schema Migrations
//!
//! The two cart tables ship inside the binary and are applied on connect.
//!
//! ```text
//! migrations/sqlite/
//! ├── 001_products.sql        products(id, name, price, is_active, ...)
//! └── 002_cart_sessions.sql   cart_sessions(key, payload, updated_at)
//! ```
//!
//! Applied versions are tracked by sqlx in `_sqlx_migrations`. Files are
//! append-only: a schema change is a new `NNN_*.sql`, never an edit.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every cart migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(embedded = MIGRATOR.migrations.len(), "Cart schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
///
/// Fails when the bookkeeping table is missing, i.e. migrations never ran.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    let applied = usize::try_from(applied)
        .map_err(|_| DbError::Internal(format!("Negative migration count: {applied}")))?;

    Ok((MIGRATOR.migrations.len(), applied))
}

// =============================================================================
// Unit Tests
// =============================================================================
