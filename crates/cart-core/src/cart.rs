//! # Cart Aggregate
//!
//! Owns the items and the cart-wide conditions, resolves unit prices through
//! the catalog, and folds everything into subtotal and total.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   items ──► for each item:                                              │
//! │               unit price (catalog) ─round─► fold item conditions ─round─│
//! │               × quantity ─round─► price_sum                             │
//! │                                                                         │
//! │   subtotal = Σ price_sum                 (terms rounded, sum is not)    │
//! │   total    = fold cart conditions over subtotal ─round─►                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Lifecycle
//! ```text
//! store ──Cart::open──► Cart ──mutate / price──► cart.save(store) ──► store
//! ```
//! One cart per session key per request. The cart does no locking; the host
//! serializes access per session.
//!
//! ## Example
//! ```rust
//! use cart_core::{Cart, CartConfig, CatalogEntry, ItemId, MemoryCatalog};
//!
//! let id = ItemId::new(1).unwrap();
//! let catalog: MemoryCatalog<CatalogEntry> = [(
//!     id,
//!     CatalogEntry { id, name: "Mug".to_string(), price: 5.24 },
//! )]
//! .into_iter()
//! .collect();
//!
//! let mut cart = Cart::new(CartConfig::default(), catalog);
//! cart.item(id).set_quantity(2).condition("coupon").set_value("-2");
//!
//! assert_eq!(cart.subtotal_without_conditions().unwrap(), 10.48);
//! assert_eq!(cart.subtotal().unwrap(), 6.48);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{resolve, CartModel, Catalog, ModelCache};
use crate::collection::KeyedCollection;
use crate::condition::{Condition, ConditionInput, ConditionOwner, Conditions};
use crate::config::CartConfig;
use crate::error::{CoreError, CoreResult};
use crate::item::{Item, PricedItem};
use crate::number_format::NumberFormat;
use crate::registry::FunctionRegistry;
use crate::store::SessionStore;
use crate::types::ItemId;
use crate::SYNC_ITEMS_HOOK;

// =============================================================================
// Item Sync Hook
// =============================================================================

/// What the `sync_items` hook sees for each line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncTarget {
    pub item_id: ItemId,
    pub quantity: u64,
    pub unit_price: f64,
}

/// The hook's verdict for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSync {
    Keep,
    SetQuantity(u64),
    Remove,
}

/// Counts of what `sync_items` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub kept: usize,
    pub updated: usize,
    pub removed: usize,
}

pub type SyncHooks = FunctionRegistry<SyncTarget, ItemSync>;

// =============================================================================
// Cart
// =============================================================================

/// The cart aggregate.
pub struct Cart<C: Catalog> {
    config: CartConfig,
    items: KeyedCollection<ItemId, Item>,
    conditions: Conditions,
    models: ModelCache<C::Model>,
    catalog: C,
    hooks: SyncHooks,
}

impl<C: Catalog> Cart<C> {
    /// Creates an empty cart.
    pub fn new(config: CartConfig, catalog: C) -> Self {
        Cart {
            config,
            items: KeyedCollection::new(),
            conditions: Conditions::new(ConditionOwner::Cart),
            models: ModelCache::new(),
            catalog,
            hooks: SyncHooks::new(),
        }
    }

    /// Restores a cart from a session store.
    ///
    /// Missing collections are written to the store as empty ones first.
    /// Collection keys win over the ids and owners stored inside entries.
    pub fn open<S>(config: CartConfig, catalog: C, store: &mut S) -> CoreResult<Self>
    where
        S: SessionStore + ?Sized,
    {
        let keys = config.session_keys();
        let mut cart = Cart::new(config, catalog);

        if !store.has(&keys.items) {
            store.put(&keys.items, serde_json::to_value(&cart.items)?)?;
        }
        if !store.has(&keys.conditions) {
            store.put(&keys.conditions, serde_json::to_value(&cart.conditions)?)?;
        }

        if let Some(items) = store.get(&keys.items)? {
            cart.items = serde_json::from_value(items)?;
        }
        if let Some(conditions) = store.get(&keys.conditions)? {
            cart.conditions = serde_json::from_value(conditions)?;
        }
        for (id, item) in cart.items.iter_mut() {
            item.rebind(*id);
        }
        cart.conditions.rebind(ConditionOwner::Cart);

        debug!(
            instance = %cart.instance_name(),
            items = cart.count(),
            conditions = cart.count_conditions(),
            "Opened cart"
        );
        Ok(cart)
    }

    /// Writes both collections back to the store.
    pub fn save<S>(&self, store: &mut S) -> CoreResult<()>
    where
        S: SessionStore + ?Sized,
    {
        let keys = self.config.session_keys();
        store.put(&keys.items, serde_json::to_value(&self.items)?)?;
        store.put(&keys.conditions, serde_json::to_value(&self.conditions)?)?;

        debug!(instance = %self.instance_name(), items = self.count(), "Saved cart");
        Ok(())
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    pub fn instance_name(&self) -> &str {
        &self.config.instance_name
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.config.number_format
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Renders an amount with the configured number format.
    pub fn format_amount(&self, value: f64) -> String {
        self.config.number_format.format(value)
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Returns the item with `id`, creating an empty line if absent.
    ///
    /// Creating a line invalidates the model cache.
    pub fn item(&mut self, id: ItemId) -> &mut Item {
        if !self.items.has(&id) {
            debug!(item_id = %id, "Creating cart item");
            self.models.invalidate();
        }
        self.items.get_or_insert_with(id, || Item::new(id))
    }

    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn has(&self, id: ItemId) -> bool {
        self.items.has(&id)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.values().map(Item::quantity).sum()
    }

    /// Removes items. Missing ids are ignored.
    pub fn remove(&mut self, ids: &[ItemId]) -> &mut Self {
        for id in ids {
            if self.items.forget(id).is_some() {
                debug!(item_id = %id, "Removed cart item");
            }
        }
        self
    }

    /// Removes every item and discards cached models.
    pub fn empty(&mut self) -> &mut Self {
        self.items = KeyedCollection::new();
        self.models.invalidate();
        debug!(instance = %self.config.instance_name, "Emptied cart items");
        self
    }

    // -------------------------------------------------------------------------
    // Cart conditions
    // -------------------------------------------------------------------------

    /// Returns the cart condition named `name`, creating it if absent.
    pub fn condition(&mut self, name: &str) -> &mut Condition {
        self.conditions.condition(name)
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.has(name)
    }

    pub fn count_conditions(&self) -> usize {
        self.conditions.len()
    }

    pub fn keys_of_conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys()
    }

    pub fn is_empty_conditions(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Removes cart conditions. Missing names are ignored.
    pub fn remove_conditions<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        self.conditions.remove(names);
        self
    }

    pub fn empty_conditions(&mut self) -> &mut Self {
        self.conditions = Conditions::new(ConditionOwner::Cart);
        debug!(instance = %self.config.instance_name, "Emptied cart conditions");
        self
    }

    /// Creates or updates cart conditions by name.
    pub fn set_conditions(&mut self, inputs: &[ConditionInput]) -> &mut Self {
        self.conditions.set_from_inputs(inputs);
        self
    }

    /// The condition collection `owner` refers to.
    ///
    /// Fails with `ItemNotFound` when an item owner is not in the cart.
    pub fn conditions_of_mut(&mut self, owner: ConditionOwner) -> CoreResult<&mut Conditions> {
        match owner {
            ConditionOwner::Cart => Ok(&mut self.conditions),
            ConditionOwner::Item { item_id } => self
                .items
                .get_mut(&item_id)
                .map(Item::conditions_mut)
                .ok_or(CoreError::ItemNotFound { item_id }),
        }
    }

    /// Renames a condition inside the collection of `owner`.
    ///
    /// Returns `Ok(None)` when no condition is named `old`.
    pub fn rename_condition(
        &mut self,
        owner: ConditionOwner,
        old: &str,
        new: impl Into<String>,
    ) -> CoreResult<Option<&mut Condition>> {
        Ok(self.conditions_of_mut(owner)?.rename(old, new))
    }

    // -------------------------------------------------------------------------
    // Models
    // -------------------------------------------------------------------------

    /// Primes the model cache; the catalog is not queried until the cache is
    /// invalidated.
    pub fn use_models(&mut self, models: HashMap<ItemId, C::Model>) -> &mut Self {
        self.models.prime(models);
        self
    }

    /// Drops cached models so the next lookup queries the catalog.
    pub fn empty_models(&mut self) -> &mut Self {
        self.models.invalidate();
        self
    }

    /// The resolved model of an item.
    pub fn model(&mut self, id: ItemId) -> CoreResult<&C::Model> {
        let ids = self.item_ids();
        let models = self.models.get_or_refresh(&self.catalog, &ids)?;
        resolve(models, id)
    }

    fn item_ids(&self) -> BTreeSet<ItemId> {
        self.items.keys().copied().collect()
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Pricing view of one item.
    pub fn priced(&mut self, id: ItemId) -> CoreResult<PricedItem<'_>> {
        if !self.items.has(&id) {
            return Err(CoreError::ItemNotFound { item_id: id });
        }

        let ids = self.item_ids();
        let models = self.models.get_or_refresh(&self.catalog, &ids)?;
        let unit_price = resolve(models, id)?.cart_price();

        let item = self
            .items
            .get(&id)
            .ok_or(CoreError::ItemNotFound { item_id: id })?;
        Ok(item.priced(unit_price, &self.config.number_format))
    }

    /// Σ `price_sum_without_conditions` over all items.
    pub fn subtotal_without_conditions(&mut self) -> CoreResult<f64> {
        self.sum_items(|priced| Ok(priced.price_sum_without_conditions()))
    }

    /// Σ `price_sum` over all items.
    pub fn subtotal(&mut self) -> CoreResult<f64> {
        self.sum_items(|priced| priced.price_sum())
    }

    /// Cart conditions folded over the subtotal, rounded.
    pub fn total(&mut self) -> CoreResult<f64> {
        let subtotal = self.subtotal()?;
        let total = self.conditions.fold(subtotal)?;
        Ok(self.config.number_format.round(total))
    }

    fn sum_items<F>(&mut self, term: F) -> CoreResult<f64>
    where
        F: Fn(PricedItem<'_>) -> CoreResult<f64>,
    {
        let ids = self.item_ids();
        let models = self.models.get_or_refresh(&self.catalog, &ids)?;
        let format = &self.config.number_format;

        self.items
            .values()
            .map(|item| -> CoreResult<f64> {
                let unit_price = resolve(models, item.id())?.cart_price();
                term(item.priced(unit_price, format))
            })
            .sum()
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    pub fn hooks(&self) -> &SyncHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut SyncHooks {
        &mut self.hooks
    }

    /// Registers the `sync_items` hook.
    pub fn on_sync_items<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&SyncTarget) -> ItemSync + Send + Sync + 'static,
    {
        self.hooks.register(SYNC_ITEMS_HOOK, hook);
        self
    }

    /// Runs the `sync_items` hook over every line and applies its verdicts.
    ///
    /// The host uses this to reconcile a restored cart with the catalog
    /// (discontinued products, stock limits).
    pub fn sync_items(&mut self) -> CoreResult<SyncSummary> {
        if !self.hooks.is_registered(SYNC_ITEMS_HOOK) {
            return Err(CoreError::UnregisteredFunction {
                name: SYNC_ITEMS_HOOK.to_string(),
            });
        }

        let ids = self.item_ids();
        let models = self.models.get_or_refresh(&self.catalog, &ids)?;
        let targets = self
            .items
            .values()
            .map(|item| -> CoreResult<SyncTarget> {
                Ok(SyncTarget {
                    item_id: item.id(),
                    quantity: item.quantity(),
                    unit_price: resolve(models, item.id())?.cart_price(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let mut summary = SyncSummary::default();
        for target in &targets {
            match self.hooks.invoke(SYNC_ITEMS_HOOK, target)? {
                ItemSync::Keep => summary.kept += 1,
                ItemSync::SetQuantity(quantity) => {
                    if let Some(item) = self.items.get_mut(&target.item_id) {
                        item.set_quantity(quantity);
                    }
                    summary.updated += 1;
                }
                ItemSync::Remove => {
                    self.items.forget(&target.item_id);
                    summary.removed += 1;
                }
            }
        }

        info!(
            kept = summary.kept,
            updated = summary.updated,
            removed = summary.removed,
            "Synced cart items"
        );
        Ok(summary)
    }
}

impl<C: Catalog> fmt::Debug for Cart<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("instance", &self.config.instance_name)
            .field("items", &self.items.len())
            .field("conditions", &self.conditions.len())
            .field("models_loaded", &self.models.is_loaded())
            .field("hooks", &self.hooks)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::catalog::{CatalogEntry, MemoryCatalog};
    use crate::store::MemoryStore;

    fn id(raw: u64) -> ItemId {
        ItemId::new(raw).unwrap()
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn entry(raw: u64, price: f64) -> (ItemId, CatalogEntry) {
        (
            id(raw),
            CatalogEntry {
                id: id(raw),
                name: format!("Product {raw}"),
                price,
            },
        )
    }

    /// Item n costs n × 5.24.
    fn catalog() -> MemoryCatalog<CatalogEntry> {
        (1..=5).map(|n| entry(n, 5.24 * n as f64)).collect()
    }

    fn cart() -> Cart<MemoryCatalog<CatalogEntry>> {
        Cart::new(CartConfig::default(), catalog())
    }

    struct CountingCatalog {
        inner: MemoryCatalog<CatalogEntry>,
        calls: Cell<usize>,
    }

    impl Catalog for CountingCatalog {
        type Model = CatalogEntry;

        fn fetch_by_ids(&self, ids: &BTreeSet<ItemId>) -> CoreResult<HashMap<ItemId, CatalogEntry>> {
            self.calls.set(self.calls.get() + 1);
            self.inner.fetch_by_ids(ids)
        }
    }

    #[test]
    fn test_item_access_is_idempotent() {
        let mut cart = cart();
        cart.item(id(1)).set_quantity(3);
        assert_eq!(cart.item(id(1)).quantity(), 3);
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_reads() {
        let mut cart = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);

        cart.item(id(2)).set_quantity(2);
        cart.item(id(1)).set_quantity(3);
        cart.condition("sale");

        assert!(cart.has(id(1)));
        assert!(!cart.has(id(3)));
        assert!(cart.has_condition("sale"));
        assert_eq!(cart.keys().collect::<Vec<_>>(), [id(2), id(1)]);
        assert_eq!(cart.keys_of_conditions().collect::<Vec<_>>(), ["sale"]);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.count_conditions(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = cart();
        cart.item(id(1));
        cart.condition("sale");

        cart.remove(&[id(1), id(4)]).remove(&[id(1)]);
        cart.remove_conditions(&["sale", "missing"]);

        assert!(cart.is_empty());
        assert!(cart.is_empty_conditions());
    }

    #[test]
    fn test_empty_updates_immediately() {
        let mut cart = cart();
        cart.item(id(1));
        cart.condition("sale");

        cart.empty();
        assert!(cart.is_empty());
        assert!(!cart.is_empty_conditions());

        cart.empty_conditions();
        assert!(cart.is_empty_conditions());
    }

    #[test]
    fn test_single_item_pricing() {
        let mut cart = cart();
        cart.item(id(1)).set_quantity(2).condition("coupon").set_value("-2");

        let priced = cart.priced(id(1)).unwrap();
        assert_eq!(priced.price_without_conditions(), 5.24);
        assert_eq!(priced.price_sum_without_conditions(), 10.48);
        assert_eq!(priced.price().unwrap(), 3.24);
        assert_eq!(priced.price_sum().unwrap(), 6.48);
    }

    #[test]
    fn test_cart_scenario() {
        let mut cart = cart();
        cart.item(id(1)).set_quantity(1).set_conditions(&[
            ConditionInput::new("sale").kind("sale").value("10%"),
            ConditionInput::new("coupon").kind("coupon").value("-1"),
        ]);
        cart.item(id(2)).set_quantity(1);

        approx(cart.subtotal_without_conditions().unwrap(), 15.72);
        approx(cart.subtotal().unwrap(), 15.24);

        cart.item(id(1)).condition("sale").set_value("-10%");
        cart.item(id(1)).condition("coupon").set_value("+1");
        approx(cart.subtotal().unwrap(), 16.20);

        cart.condition("sale").set_kind("sale").set_value("-10%");
        approx(cart.total().unwrap(), 14.58);

        cart.condition("bonus").set_kind("bonus").set_value("+2");
        approx(cart.total().unwrap(), 16.58);
    }

    #[test]
    fn test_disabled_format_is_unrounded() {
        let config = CartConfig {
            number_format: NumberFormat::Disabled,
            ..CartConfig::default()
        };
        let mut cart = Cart::new(config, catalog());
        cart.item(id(1)).set_quantity(1).condition("sale").set_value("10%");
        cart.item(id(1)).condition("coupon").set_value("-1");

        approx(cart.subtotal().unwrap(), 4.764);
        cart.condition("sale").set_value("-10%");
        approx(cart.total().unwrap(), 4.2876);
    }

    #[test]
    fn test_total_of_empty_cart() {
        let mut cart = cart();
        cart.condition("shipping").set_value("+5");
        assert_eq!(cart.subtotal().unwrap(), 0.0);
        assert_eq!(cart.total().unwrap(), 5.0);
    }

    #[test]
    fn test_missing_model_is_lookup_error() {
        let mut cart = cart();
        cart.item(id(42)).set_quantity(1);

        let err = cart.subtotal().unwrap_err();
        assert!(matches!(err, CoreError::ModelNotFound { item_id } if item_id == id(42)));
    }

    #[test]
    fn test_catalog_failure_propagates() {
        struct OfflineCatalog;

        impl Catalog for OfflineCatalog {
            type Model = CatalogEntry;

            fn fetch_by_ids(&self, _ids: &BTreeSet<ItemId>) -> CoreResult<HashMap<ItemId, CatalogEntry>> {
                Err(CoreError::Catalog("connection refused".to_string()))
            }
        }

        let mut cart = Cart::new(CartConfig::default(), OfflineCatalog);
        cart.item(id(1)).set_quantity(1);

        assert!(matches!(cart.total(), Err(CoreError::Catalog(_))));
        assert!(matches!(cart.model(id(1)), Err(CoreError::Catalog(_))));
    }

    #[test]
    fn test_pricing_unknown_item_fails() {
        let mut cart = cart();
        assert!(matches!(
            cart.priced(id(1)),
            Err(CoreError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn test_model_cache_invalidated_by_new_items() {
        let catalog = CountingCatalog {
            inner: catalog(),
            calls: Cell::new(0),
        };
        let mut cart = Cart::new(CartConfig::default(), catalog);
        cart.item(id(1)).set_quantity(1);

        cart.subtotal().unwrap();
        cart.total().unwrap();
        assert_eq!(cart.catalog().calls.get(), 1);

        // existing item: no invalidation
        cart.item(id(1)).set_quantity(2);
        cart.subtotal().unwrap();
        assert_eq!(cart.catalog().calls.get(), 1);

        cart.item(id(2)).set_quantity(1);
        approx(cart.subtotal().unwrap(), 20.96);
        assert_eq!(cart.catalog().calls.get(), 2);

        cart.empty();
        assert_eq!(cart.subtotal().unwrap(), 0.0);
        assert_eq!(cart.catalog().calls.get(), 2);
    }

    #[test]
    fn test_use_models_skips_catalog() {
        let catalog = CountingCatalog {
            inner: MemoryCatalog::new(),
            calls: Cell::new(0),
        };
        let mut cart = Cart::new(CartConfig::default(), catalog);
        cart.item(id(1)).set_quantity(2);
        cart.use_models([entry(1, 1.5)].into());

        assert_eq!(cart.model(id(1)).unwrap().name, "Product 1");
        assert_eq!(cart.subtotal().unwrap(), 3.0);
        assert_eq!(cart.catalog().calls.get(), 0);

        cart.empty_models();
        assert!(cart.subtotal().is_err());
        assert_eq!(cart.catalog().calls.get(), 1);
    }

    #[test]
    fn test_rename_cart_condition() {
        let mut cart = cart();
        let sale = cart.condition("sale").id();
        cart.condition("bonus");

        let renamed = cart
            .rename_condition(ConditionOwner::Cart, "sale", "summer_sale")
            .unwrap()
            .unwrap();
        assert_eq!(renamed.id(), sale);

        assert!(cart.has_condition("summer_sale"));
        assert!(!cart.has_condition("sale"));
        assert_eq!(cart.keys_of_conditions().collect::<Vec<_>>(), ["bonus", "summer_sale"]);
    }

    #[test]
    fn test_rename_item_condition_through_owner() {
        let mut cart = cart();
        let owner = cart.item(id(1)).condition("sale").owner();

        cart.rename_condition(owner, "sale", "promo").unwrap();

        let item = cart.get_item(id(1)).unwrap();
        assert!(item.has_condition("promo"));
        assert!(!item.has_condition("sale"));
    }

    #[test]
    fn test_rename_for_missing_item_fails() {
        let mut cart = cart();
        let owner = ConditionOwner::Item { item_id: id(9) };

        let err = cart.rename_condition(owner, "sale", "promo").unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound { .. }));
    }

    #[test]
    fn test_open_initializes_store_and_save_restores() {
        let mut store = MemoryStore::new();
        let config = CartConfig::default();
        let keys = config.session_keys();

        let mut cart = Cart::open(config.clone(), catalog(), &mut store).unwrap();
        assert!(store.has(&keys.items));
        assert!(store.has(&keys.conditions));
        assert!(cart.is_empty());

        cart.item(id(2)).set_quantity(1).merge_attributes([("size", "M")]);
        cart.item(id(1)).set_quantity(2).condition("coupon").set_value("-2");
        let sale = cart.condition("sale").set_value("-10%").id();
        cart.save(&mut store).unwrap();

        let mut restored = Cart::open(config, catalog(), &mut store).unwrap();
        assert_eq!(restored.keys().collect::<Vec<_>>(), [id(2), id(1)]);
        assert_eq!(restored.conditions().get("sale").unwrap().id(), sale);
        assert_eq!(
            restored.get_item(id(2)).unwrap().attributes().get("size").unwrap(),
            "M"
        );
        approx(restored.total().unwrap(), 15.26);
    }

    #[test]
    fn test_save_and_open_keep_condition_order() {
        let mut store = MemoryStore::new();
        let config = CartConfig::default();

        let mut cart = Cart::open(config.clone(), catalog(), &mut store).unwrap();
        cart.item(id(2)).set_quantity(1);
        // (5.24 - 1) × 1.1 = 4.664; the other way round it would be 4.764
        cart.item(id(1)).set_quantity(1).condition("zeta").set_value("-1");
        cart.item(id(1)).condition("alpha").set_value("10%");
        // 15.14 × 0.9 + 2 = 15.626; the other way round (15.14 + 2) × 0.9 = 15.426
        cart.condition("zeta").set_value("-10%");
        cart.condition("alpha").set_value("+2");

        approx(cart.subtotal().unwrap(), 15.14);
        assert_eq!(cart.total().unwrap(), 15.63);
        cart.save(&mut store).unwrap();

        let mut restored = Cart::open(config, catalog(), &mut store).unwrap();
        assert_eq!(restored.keys().collect::<Vec<_>>(), [id(2), id(1)]);
        assert_eq!(restored.keys_of_conditions().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(
            restored.get_item(id(1)).unwrap().conditions().keys().collect::<Vec<_>>(),
            ["zeta", "alpha"]
        );
        approx(restored.subtotal().unwrap(), 15.14);
        assert_eq!(restored.total().unwrap(), 15.63);
    }

    #[test]
    fn test_open_rebuilds_ids_and_owners_from_keys() {
        let mut store = MemoryStore::new();
        let config = CartConfig::default();
        let keys = config.session_keys();

        let mut cart = Cart::open(config.clone(), catalog(), &mut store).unwrap();
        cart.item(id(1)).set_quantity(1).condition("sale").set_value("-10%");
        cart.condition("member").set_value("-5%");
        cart.save(&mut store).unwrap();

        let mut items = store.get(&keys.items).unwrap().unwrap();
        items["1"]["id"] = json!(2);
        items["1"]["conditions"]["entries"]["sale"]["item_id"] = json!(2);
        items["1"]["conditions"]["entries"]["sale"]["name"] = json!("other");
        store.put(&keys.items, items).unwrap();

        let mut conditions = store.get(&keys.conditions).unwrap().unwrap();
        conditions["entries"]["member"]["owner"] = json!("item");
        conditions["entries"]["member"]["item_id"] = json!(1);
        store.put(&keys.conditions, conditions).unwrap();

        let restored = Cart::open(config, catalog(), &mut store).unwrap();
        let item = restored.get_item(id(1)).unwrap();
        let sale = item.conditions().get("sale").unwrap();

        assert_eq!(item.id(), id(1));
        assert_eq!(sale.owner(), ConditionOwner::Item { item_id: id(1) });
        assert_eq!(sale.name(), "sale");
        assert_eq!(item.conditions().owner(), ConditionOwner::Item { item_id: id(1) });
        assert_eq!(restored.conditions().get("member").unwrap().owner(), ConditionOwner::Cart);
    }

    #[test]
    fn test_sync_items_applies_verdicts() {
        let mut cart = cart();
        cart.item(id(1)).set_quantity(1);
        cart.item(id(2)).set_quantity(20);
        cart.item(id(3)).set_quantity(1);

        cart.on_sync_items(|target| match target.item_id.get() {
            2 => ItemSync::SetQuantity(10),
            3 => ItemSync::Remove,
            _ => ItemSync::Keep,
        });

        let summary = cart.sync_items().unwrap();
        assert_eq!(
            summary,
            SyncSummary {
                kept: 1,
                updated: 1,
                removed: 1
            }
        );
        assert_eq!(cart.get_item(id(2)).unwrap().quantity(), 10);
        assert!(!cart.has(id(3)));
    }

    #[test]
    fn test_sync_items_without_hook_fails() {
        let mut cart = cart();
        let err = cart.sync_items().unwrap_err();
        assert!(matches!(err, CoreError::UnregisteredFunction { .. }));
    }

    #[test]
    fn test_format_amount() {
        let cart = cart();
        assert_eq!(cart.format_amount(16.2), "16.20");
        assert_eq!(cart.instance_name(), "cart");
    }
}
