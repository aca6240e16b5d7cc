//! # Repository Module
//!
//! Database repository implementations for the cart engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Host request handler                                                  │
//! │       │                                                                 │
//! │       │  db.sessions().load_store(&keys)                               │
//! │       │  db.products().load_catalog_for(&ids)                          │
//! │       ▼                                                                 │
//! │  ProductRepository              SessionRepository                      │
//! │  ├── insert / get_by_id         ├── has / get / put / forget           │
//! │  ├── fetch_by_ids               ├── load_store                         │
//! │  └── load_catalog               └── flush_store                        │
//! │       │                                │                                │
//! │       │  SQL Query                     │                                │
//! │       ▼                                ▼                                │
//! │  products                       cart_sessions                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog rows and snapshots
//! - [`SessionRepository`](session::SessionRepository) - Cart session payloads

pub mod product;
pub mod session;
