//! # Domain Types
//!
//! Small value types shared by items, conditions, and the cart.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────────────────────────┐     │
//! │  │     ItemId      │   │              Attributes                 │     │
//! │  │  ─────────────  │   │  ─────────────────────────────────────  │     │
//! │  │  u64, >= 1      │   │  "size"  → "M"                          │     │
//! │  │  catalog key    │   │  "color" → "green"                      │     │
//! │  └─────────────────┘   │  merge / clear, no other behavior       │     │
//! │                        └─────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Item Identifier
// =============================================================================

/// Identifier of a cart line.
///
/// The same id is the key of the item inside the cart and the key used to
/// resolve the item's model from the catalog. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ItemId(u64);

impl ItemId {
    /// Creates an item id, rejecting zero.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::ItemId;
    ///
    /// assert_eq!(ItemId::new(3).unwrap().get(), 3);
    /// assert!(ItemId::new(0).is_err());
    /// ```
    pub fn new(raw: u64) -> ValidationResult<Self> {
        if raw == 0 {
            return Err(ValidationError::MustBePositive {
                field: "item id".to_string(),
            });
        }

        Ok(ItemId(raw))
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ItemId {
    type Error = ValidationError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        ItemId::new(raw)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Free-form key/value bag attached to items and conditions.
///
/// The engine never reads attributes; they travel with the entity for the
/// host's benefit (size, color, campaign code, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    /// Creates an empty attribute bag.
    pub fn new() -> Self {
        Attributes::default()
    }

    /// Merges attributes into the bag. Existing keys are overwritten.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::Attributes;
    ///
    /// let mut attrs = Attributes::new();
    /// attrs.merge([("size", "S")]);
    /// attrs.merge([("size", "L"), ("option", "2")]);
    ///
    /// assert_eq!(attrs.get("size").unwrap(), "L");
    /// assert_eq!(attrs.len(), 2);
    /// ```
    pub fn merge<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.0.insert(key.into(), value.into());
        }
    }

    /// Merges another attribute bag into this one.
    pub fn merge_from(&mut self, other: &Attributes) {
        self.merge(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Checks whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        attributes.merge(iter);
        attributes
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
