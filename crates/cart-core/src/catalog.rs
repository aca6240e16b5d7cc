//! # Catalog Boundary
//!
//! The cart never stores prices. It resolves a model per item id from a
//! [`Catalog`] and reads the unit price from [`CartModel::cart_price`].
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cart.subtotal()                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ModelCache::get_or_refresh(catalog, {1, 2})                            │
//! │       │                                                                 │
//! │       ├── loaded?  ──yes──► cached models                               │
//! │       │                                                                 │
//! │       └── no ──► ids empty? ──yes──► {} (catalog not queried)           │
//! │                      │                                                  │
//! │                      no ──► catalog.fetch_by_ids({1, 2}) ──► cache      │
//! │                                                                         │
//! │  Invalidated by: cart.item(new id), cart.empty(), cart.empty_models()   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::types::ItemId;

// =============================================================================
// Traits
// =============================================================================

/// Anything that can be priced in a cart.
pub trait CartModel {
    /// Unit price before any condition.
    fn cart_price(&self) -> f64;
}

/// Bulk lookup of cart models by item id.
///
/// Ids missing from the catalog are simply absent from the returned map;
/// the cart turns that into [`CoreError::ModelNotFound`] when it needs them.
pub trait Catalog {
    type Model: CartModel;

    fn fetch_by_ids(&self, ids: &BTreeSet<ItemId>) -> CoreResult<HashMap<ItemId, Self::Model>>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    type Model = C::Model;

    fn fetch_by_ids(&self, ids: &BTreeSet<ItemId>) -> CoreResult<HashMap<ItemId, Self::Model>> {
        (**self).fetch_by_ids(ids)
    }
}

// =============================================================================
// Model Cache
// =============================================================================

/// Lazily filled cache of resolved models.
#[derive(Debug)]
pub struct ModelCache<M> {
    models: Option<HashMap<ItemId, M>>,
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        ModelCache { models: None }
    }
}

impl<M> ModelCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.models.is_some()
    }

    /// Drops cached models; the next lookup queries the catalog again.
    pub fn invalidate(&mut self) {
        if self.models.take().is_some() {
            debug!("Model cache invalidated");
        }
    }

    /// Replaces the cache with the given models without querying a catalog.
    pub fn prime(&mut self, models: HashMap<ItemId, M>) {
        debug!(count = models.len(), "Model cache primed");
        self.models = Some(models);
    }

    /// Returns cached models, fetching them for `ids` first if the cache is
    /// empty. An empty id set resolves to an empty map without a query.
    pub fn get_or_refresh<C>(&mut self, catalog: &C, ids: &BTreeSet<ItemId>) -> CoreResult<&HashMap<ItemId, M>>
    where
        C: Catalog<Model = M> + ?Sized,
    {
        if self.models.is_none() {
            let models = if ids.is_empty() {
                HashMap::new()
            } else {
                let fetched = catalog.fetch_by_ids(ids)?;
                debug!(requested = ids.len(), resolved = fetched.len(), "Resolved cart models");
                fetched
            };
            self.models = Some(models);
        }

        Ok(self.models.get_or_insert_with(HashMap::new))
    }
}

/// Looks up one model, failing with `ModelNotFound` when it is absent.
pub fn resolve<M>(models: &HashMap<ItemId, M>, item_id: ItemId) -> CoreResult<&M> {
    models.get(&item_id).ok_or(CoreError::ModelNotFound { item_id })
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Catalog backed by a map. Used for tests, demos, and as the per-request
/// snapshot loaded from the database.
#[derive(Debug, Clone)]
pub struct MemoryCatalog<M> {
    models: HashMap<ItemId, M>,
}

impl<M> Default for MemoryCatalog<M> {
    fn default() -> Self {
        MemoryCatalog {
            models: HashMap::new(),
        }
    }
}

impl<M: CartModel + Clone> MemoryCatalog<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ItemId, model: M) -> &mut Self {
        self.models.insert(id, model);
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<M: CartModel + Clone> FromIterator<(ItemId, M)> for MemoryCatalog<M> {
    fn from_iter<I: IntoIterator<Item = (ItemId, M)>>(iter: I) -> Self {
        MemoryCatalog {
            models: iter.into_iter().collect(),
        }
    }
}

impl<M: CartModel + Clone> Catalog for MemoryCatalog<M> {
    type Model = M;

    fn fetch_by_ids(&self, ids: &BTreeSet<ItemId>) -> CoreResult<HashMap<ItemId, M>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.models.get(id).map(|m| (*id, m.clone())))
            .collect())
    }
}

/// Minimal priced model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
}

impl CartModel for CatalogEntry {
    fn cart_price(&self) -> f64 {
        self.price
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
