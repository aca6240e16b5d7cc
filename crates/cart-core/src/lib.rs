//! # cart-core: Pricing and Condition Engine
//!
//! This crate is the engine of the cart. It stores items and conditions,
//! folds conditions into prices, and applies the rounding cascade that makes
//! totals reproducible.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Engine Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Host Application                             │   │
//! │  │    request ──► Cart::open ──► mutate ──► total ──► cart.save    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cart-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │   item    │  │ condition │  │  catalog  │  │   │
//! │  │   │   Cart    │  │   Item    │  │ Condition │  │  Catalog  │  │   │
//! │  │   │ SyncHooks │  │PricedItem │  │Conditions │  │ModelCache │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • SYNCHRONOUS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ Catalog / SessionStore traits          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cart-db (Database Layer)                     │   │
//! │  │          products catalog, cart_sessions, migrations            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - The cart aggregate, subtotal/total, `sync_items`
//! - [`item`] - Cart lines and the per-item pricing view
//! - [`condition`] - Conditions, value grammar, rename relocation
//! - [`collection`] - Insertion-ordered keyed collection
//! - [`catalog`] - Catalog boundary and the resolved-model cache
//! - [`store`] - Session store boundary
//! - [`registry`] - Named hook registry
//! - [`number_format`] - Rounding and display
//! - [`config`] - Cart configuration (TOML + environment)
//! - [`types`] - Item ids and attribute maps
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cart_core::{Cart, CartConfig, CatalogEntry, ItemId, MemoryCatalog};
//!
//! let mug = ItemId::new(1).unwrap();
//! let tea = ItemId::new(2).unwrap();
//! let catalog: MemoryCatalog<CatalogEntry> = [
//!     (mug, CatalogEntry { id: mug, name: "Mug".into(), price: 5.24 }),
//!     (tea, CatalogEntry { id: tea, name: "Tea".into(), price: 10.48 }),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut cart = Cart::new(CartConfig::default(), catalog);
//! cart.item(mug).set_quantity(1);
//! cart.item(mug).condition("sale").set_value("-10%");
//! cart.item(mug).condition("engraving").set_value("+1");
//! cart.item(tea).set_quantity(1);
//!
//! // 5.24 × 0.9 + 1 = 5.716 → 5.72, plus 10.48
//! assert!((cart.subtotal().unwrap() - 16.20).abs() < 1e-9);
//!
//! cart.condition("member").set_value("-10%");
//! assert_eq!(cart.total().unwrap(), 14.58);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod collection;
pub mod condition;
pub mod config;
pub mod error;
pub mod item;
pub mod number_format;
pub mod registry;
pub mod store;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, ItemSync, SyncHooks, SyncSummary, SyncTarget};
pub use catalog::{CartModel, Catalog, CatalogEntry, MemoryCatalog, ModelCache};
pub use collection::KeyedCollection;
pub use condition::{Condition, ConditionInput, ConditionOwner, ConditionValue, Conditions};
pub use config::CartConfig;
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use item::{Item, ItemUpdate, PricedItem};
pub use number_format::NumberFormat;
pub use registry::FunctionRegistry;
pub use store::{stored_item_ids, MemoryStore, SessionKeys, SessionStore};
pub use types::{Attributes, ItemId};

// =============================================================================
// Constants
// =============================================================================

/// Type and value of a freshly created condition. As a value it is a no-op.
pub const UNDEFINED: &str = "undefined";

/// Registry name of the item sync hook.
pub const SYNC_ITEMS_HOOK: &str = "sync_items";
