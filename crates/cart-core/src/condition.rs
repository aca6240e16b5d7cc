//! # Conditions
//!
//! A condition is a named price adjustment. The same type serves cart-wide
//! and per-item conditions; the [`ConditionOwner`] says which collection it
//! lives in.
//!
//! ## Value Grammar
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  value             meaning                     apply(10.00)             │
//! │  ───────────────   ─────────────────────────   ────────────             │
//! │  "undefined"       no-op                       10.00                    │
//! │  "2" / "+2"        add flat                    12.00                    │
//! │  "-2"              subtract flat               8.00                     │
//! │  "10%" / "+10%"    add percentage              11.00                    │
//! │  "-10%"            subtract percentage         9.00                     │
//! │  "-20"             subtract flat, clamped      0.00                     │
//! │                                                                         │
//! │  '%' anywhere → percentage    '-' anywhere → subtract                   │
//! │  magnitude = value with '%', '+', '-' stripped                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Folding
//! A [`Conditions`] collection applies its entries in insertion order, each
//! result feeding the next. No rounding happens inside the fold.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::collection::KeyedCollection;
use crate::error::{CoreError, CoreResult, ValidationError, ValidationResult};
use crate::types::{Attributes, ItemId};
use crate::UNDEFINED;

// =============================================================================
// Owner
// =============================================================================

/// Which collection a condition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner", rename_all = "snake_case")]
pub enum ConditionOwner {
    /// Applies to the cart subtotal.
    Cart,
    /// Applies to the unit price of one item.
    Item { item_id: ItemId },
}

// =============================================================================
// Parsed Value
// =============================================================================

/// A condition value after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionValue {
    /// The "undefined" sentinel.
    Undefined,
    Adjustment {
        magnitude: f64,
        percentage: bool,
        subtract: bool,
    },
}

impl ConditionValue {
    /// Parses a value expression. `name` is only used for the error.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::ConditionValue;
    ///
    /// let value = ConditionValue::parse("sale", "-10%").unwrap();
    /// assert_eq!(
    ///     value,
    ///     ConditionValue::Adjustment { magnitude: 10.0, percentage: true, subtract: true }
    /// );
    /// assert!(ConditionValue::parse("sale", "ten").is_err());
    /// ```
    pub fn parse(name: &str, value: &str) -> CoreResult<Self> {
        if value == UNDEFINED {
            return Ok(ConditionValue::Undefined);
        }

        let invalid = || CoreError::InvalidConditionValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        let stripped: String = value.chars().filter(|c| !matches!(c, '%' | '+' | '-')).collect();
        let magnitude: f64 = stripped.trim().parse().map_err(|_| invalid())?;
        if !magnitude.is_finite() {
            return Err(invalid());
        }

        Ok(ConditionValue::Adjustment {
            magnitude,
            percentage: value.contains('%'),
            subtract: value.contains('-'),
        })
    }

    /// Applies the adjustment to `price`, clamping at zero.
    pub fn apply(&self, price: f64) -> f64 {
        let ConditionValue::Adjustment {
            magnitude,
            percentage,
            subtract,
        } = *self
        else {
            return price;
        };

        let delta = if percentage {
            price * (magnitude / 100.0)
        } else {
            magnitude
        };
        let adjusted = if subtract { price - delta } else { price + delta };

        adjusted.max(0.0)
    }
}

// =============================================================================
// Condition
// =============================================================================

/// A named price adjustment rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    id: Uuid,
    name: String,
    /// Free-form tag ("sale", "tax", "coupon", ...). Not interpreted.
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    attributes: Attributes,
    /// Name before the most recent rename. Equals `name` until renamed.
    last_name: String,
    #[serde(flatten)]
    owner: ConditionOwner,
}

impl Condition {
    /// Creates a condition with type and value "undefined".
    pub fn new(name: impl Into<String>, owner: ConditionOwner) -> Self {
        let name = name.into();
        Condition {
            id: Uuid::new_v4(),
            last_name: name.clone(),
            name,
            kind: UNDEFINED.to_string(),
            value: UNDEFINED.to_string(),
            attributes: Attributes::new(),
            owner,
        }
    }

    /// Stable identity, preserved by renames and persistence.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn owner(&self) -> ConditionOwner {
        self.owner
    }

    pub fn set_kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.kind = kind.into();
        self
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = value.into();
        self
    }

    pub fn merge_attributes<I, K, V>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.attributes.merge(attributes);
        self
    }

    pub fn clear_attributes(&mut self) -> &mut Self {
        self.attributes.clear();
        self
    }

    /// Applies the present fields of `input`. Absent fields keep their
    /// current value; attributes are merged. The name is left alone, renames
    /// go through the owning collection.
    pub fn set(&mut self, input: &ConditionInput) -> &mut Self {
        if let Some(kind) = &input.kind {
            self.kind = kind.clone();
        }
        if let Some(value) = &input.value {
            self.value = value.clone();
        }
        if let Some(attributes) = &input.attributes {
            self.attributes.merge_from(attributes);
        }
        self
    }

    /// Applies this condition to `price`.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::{Condition, ConditionOwner};
    ///
    /// let mut c = Condition::new("sale", ConditionOwner::Cart);
    /// c.set_value("-0.5");
    /// assert_eq!(c.apply(1.0).unwrap(), 0.5);
    /// ```
    pub fn apply(&self, price: f64) -> CoreResult<f64> {
        Ok(ConditionValue::parse(&self.name, &self.value)?.apply(price))
    }

    fn rename_to(&mut self, name: String) {
        self.last_name = std::mem::replace(&mut self.name, name);
    }
}

// =============================================================================
// Condition Input
// =============================================================================

/// Bulk create-or-update payload for a condition.
///
/// ```json
/// { "name": "sale", "type": "discount", "value": "-10%", "attributes": { "code": "X1" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionInput {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl ConditionInput {
    pub fn new(name: impl Into<String>) -> Self {
        ConditionInput {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Checks that name, type and value are present and non-empty.
    ///
    /// The engine never calls this; hosts that accept conditions from
    /// untrusted input call it before `set_conditions`.
    pub fn validate(&self) -> ValidationResult<()> {
        required("name", Some(&self.name))?;
        required("type", self.kind.as_ref())?;
        required("value", self.value.as_ref())?;
        Ok(())
    }
}

fn required(field: &str, value: Option<&String>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// Condition Collection
// =============================================================================

/// Ordered, name-keyed conditions of one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    owner: ConditionOwner,
    entries: KeyedCollection<String, Condition>,
}

impl Conditions {
    pub fn new(owner: ConditionOwner) -> Self {
        Conditions {
            owner,
            entries: KeyedCollection::new(),
        }
    }

    pub fn owner(&self) -> ConditionOwner {
        self.owner
    }

    /// Returns the condition named `name`, creating an "undefined" one at the
    /// end of the collection if absent.
    pub fn condition(&mut self, name: &str) -> &mut Condition {
        let owner = self.owner;
        self.entries.get_or_insert_with(name.to_string(), || {
            debug!(condition = %name, ?owner, "Creating condition");
            Condition::new(name, owner)
        })
    }

    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.entries.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.has(name)
    }

    /// Removes conditions by name. Missing names are ignored.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            if self.entries.forget(name.as_ref()).is_some() {
                debug!(condition = %name.as_ref(), owner = ?self.owner, "Removed condition");
            }
        }
    }

    /// Renames a condition.
    ///
    /// The condition is removed from its slot and stored under `new`:
    /// appended at the end, or in the slot of an existing `new` entry, which
    /// it replaces. Renaming to the current name changes nothing.
    ///
    /// Returns `None` when no condition is named `old`.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::{ConditionOwner, Conditions};
    ///
    /// let mut conditions = Conditions::new(ConditionOwner::Cart);
    /// conditions.condition("a");
    /// conditions.condition("b");
    /// conditions.rename("a", "c");
    ///
    /// assert_eq!(conditions.keys().collect::<Vec<_>>(), ["b", "c"]);
    /// ```
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Option<&mut Condition> {
        let new = new.into();
        if old == new {
            return self.entries.get_mut(old);
        }

        let mut condition = self.entries.forget(old)?;
        condition.rename_to(new.clone());

        if let Some(replaced) = self.entries.put(new.clone(), condition) {
            warn!(
                from = %old,
                to = %new,
                replaced = %replaced.id(),
                "Condition rename replaced an existing condition"
            );
        } else {
            debug!(from = %old, to = %new, owner = ?self.owner, "Renamed condition");
        }

        self.entries.get_mut(&new)
    }

    /// Makes the collection key and `owner` authoritative for every entry.
    ///
    /// Applied to collections read back from a session store, where a stale
    /// or edited payload can disagree with the key it is stored under.
    pub(crate) fn rebind(&mut self, owner: ConditionOwner) {
        self.owner = owner;
        for (name, condition) in self.entries.iter_mut() {
            if condition.owner != owner {
                warn!(condition = %name, stored = ?condition.owner, ?owner, "Rebinding condition owner");
                condition.owner = owner;
            }
            if condition.name != *name {
                warn!(condition = %name, stored = %condition.name, "Rebinding condition name to its key");
                condition.name = name.clone();
            }
        }
    }

    /// Creates or updates conditions by name. Existing conditions keep their
    /// position; new ones are appended in input order.
    pub fn set_from_inputs(&mut self, inputs: &[ConditionInput]) {
        for input in inputs {
            self.condition(&input.name).set(input);
        }
    }

    /// Folds every condition over `price` in collection order.
    pub fn fold(&self, price: f64) -> CoreResult<f64> {
        self.entries
            .values()
            .try_fold(price, |price, condition| condition.apply(price))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
