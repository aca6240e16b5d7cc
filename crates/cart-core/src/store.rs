//! # Session Store Boundary
//!
//! The cart is rebuilt per request from two collections held in a session
//! store, and written back when the request is done.
//!
//! ```text
//! prefix "cart"
//!   ├── "cart_cart_items"       → { "1": Item, "2": Item, ... }
//!   └── "cart_cart_conditions"  → Conditions (cart-owned)
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::de::IgnoredAny;
use serde_json::Value;

use crate::collection::KeyedCollection;
use crate::error::CoreResult;
use crate::types::ItemId;

/// Key/value persistence for cart collections.
///
/// Values are JSON documents; the cart owns their shape.
pub trait SessionStore {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> CoreResult<Option<Value>>;

    fn put(&mut self, key: &str, value: Value) -> CoreResult<()>;
}

/// Store keys for one cart instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub items: String,
    pub conditions: String,
}

impl SessionKeys {
    /// Derives both keys from a prefix.
    ///
    /// ```rust
    /// use cart_core::SessionKeys;
    ///
    /// let keys = SessionKeys::from_prefix("shop");
    /// assert_eq!(keys.items, "shop_cart_items");
    /// assert_eq!(keys.conditions, "shop_cart_conditions");
    /// ```
    pub fn from_prefix(prefix: &str) -> Self {
        SessionKeys {
            items: format!("{prefix}_cart_items"),
            conditions: format!("{prefix}_cart_conditions"),
        }
    }
}

/// Ids of the items saved under `keys`, without building the items.
///
/// Lets a host fetch only the catalog rows a restored cart needs before
/// calling `Cart::open`. A missing document yields an empty set.
pub fn stored_item_ids<S>(store: &S, keys: &SessionKeys) -> CoreResult<BTreeSet<ItemId>>
where
    S: SessionStore + ?Sized,
{
    let Some(items) = store.get(&keys.items)? else {
        return Ok(BTreeSet::new());
    };

    let items: KeyedCollection<ItemId, IgnoredAny> = serde_json::from_value(items)?;
    Ok(items.keys().copied().collect())
}

/// In-memory session store.
///
/// Also the unit of work for database-backed sessions: loaded once per
/// request, mutated synchronously, flushed at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl SessionStore for MemoryStore {
    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> CoreResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> CoreResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl FromIterator<(String, Value)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        MemoryStore {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_memory_store_put_get() {
        let mut store = MemoryStore::new();
        assert!(!store.has("k"));
        assert_eq!(store.get("k").unwrap(), None);

        store.put("k", json!({"a": 1})).unwrap();
        assert!(store.has("k"));
        assert_eq!(store.get("k").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_stored_item_ids() {
        let keys = SessionKeys::from_prefix("cart");
        let mut store = MemoryStore::new();
        assert!(stored_item_ids(&store, &keys).unwrap().is_empty());

        store
            .put(&keys.items, json!({"7": {"anything": true}, "3": {}}))
            .unwrap();
        let ids: Vec<u64> = stored_item_ids(&store, &keys)
            .unwrap()
            .into_iter()
            .map(|id| id.get())
            .collect();
        assert_eq!(ids, [3, 7]);

        store.put(&keys.items, json!({"0": {}})).unwrap();
        assert!(stored_item_ids(&store, &keys).is_err());
    }
}
