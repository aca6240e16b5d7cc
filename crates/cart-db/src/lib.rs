//! # cart-db: Database Layer for the Cart Engine
//!
//! SQLite implementations of the collaborators cart-core defines: the
//! product catalog and the session store. Uses sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Request Data Flow                           │
//! │                                                                         │
//! │  Host request handler                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cart-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_products │  │   │
//! │  │   │ SqlitePool    │◄───│ SessionRepo   │    │ 002_sessions │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │ MemoryCatalog, MemoryStore                                      │
//! │       ▼                                                                 │
//! │  cart-core Cart (synchronous)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and session repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cart_core::{Cart, CartConfig};
//! use cart_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cart.db")).await?;
//! let config = CartConfig::load_or_default(Some("cart.toml".into()));
//! let keys = config.session_keys();
//!
//! let mut store = db.sessions().load_store(&keys).await?;
//! let ids = cart_core::stored_item_ids(&store, &keys)?;
//! let catalog = db.products().load_catalog_for(&ids).await?;
//! let mut cart = Cart::open(config, catalog, &mut store)?;
//! let total = cart.total()?;
//! println!("total: {}", cart.format_amount(total));
//! cart.save(&mut store)?;
//! db.sessions().flush_store(&store, &keys).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::product::{NewProduct, ProductRecord, ProductRepository};
pub use repository::session::SessionRepository;
