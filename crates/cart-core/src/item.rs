//! # Cart Items
//!
//! One cart line: id, quantity, attributes, and the item's own conditions.
//!
//! An item does not know its unit price. The cart resolves it from the
//! catalog and hands it to [`Item::priced`], which returns a [`PricedItem`]
//! view for the four pricing figures.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::condition::{Condition, ConditionInput, ConditionOwner, Conditions};
use crate::error::CoreResult;
use crate::number_format::NumberFormat;
use crate::types::{Attributes, ItemId};

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    quantity: u64,
    #[serde(default)]
    attributes: Attributes,
    conditions: Conditions,
}

/// Bulk update payload for an item.
///
/// Mirrors the keys a host would accept from a form or API body:
/// ```json
/// { "quantity": 2, "add_quantity": 1, "attributes": { "size": "M" },
///   "conditions": [{ "name": "sale", "type": "sale", "value": "-10%" }] }
/// ```
/// Fields are applied in declaration order; absent fields are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub add_quantity: Option<i64>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub conditions: Option<Vec<ConditionInput>>,
}

impl Item {
    /// Creates an empty line (quantity 0, no attributes, no conditions).
    pub fn new(id: ItemId) -> Self {
        Item {
            id,
            quantity: 0,
            attributes: Attributes::new(),
            conditions: Conditions::new(ConditionOwner::Item { item_id: id }),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u64) -> &mut Self {
        self.quantity = quantity;
        self
    }

    /// Adds `delta` to the quantity. A negative delta never takes the
    /// quantity below zero.
    pub fn add_quantity(&mut self, delta: i64) -> &mut Self {
        self.quantity = self.quantity.saturating_add_signed(delta);
        self
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
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

    // -------------------------------------------------------------------------
    // Item conditions
    // -------------------------------------------------------------------------

    /// Returns the item condition named `name`, creating it if absent.
    pub fn condition(&mut self, name: &str) -> &mut Condition {
        self.conditions.condition(name)
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.has(name)
    }

    pub fn is_empty_conditions(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn remove_condition(&mut self, name: &str) -> &mut Self {
        self.conditions.remove(&[name]);
        self
    }

    pub fn clear_conditions(&mut self) -> &mut Self {
        self.conditions.clear();
        self
    }

    /// Renames one of this item's conditions. See [`Conditions::rename`].
    pub fn rename_condition(&mut self, old: &str, new: impl Into<String>) -> Option<&mut Condition> {
        self.conditions.rename(old, new)
    }

    /// Creates or updates conditions by name.
    pub fn set_conditions(&mut self, inputs: &[ConditionInput]) -> &mut Self {
        self.conditions.set_from_inputs(inputs);
        self
    }

    /// Applies a bulk update.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::{Item, ItemId, ItemUpdate};
    ///
    /// let mut item = Item::new(ItemId::new(1).unwrap());
    /// item.apply_update(&ItemUpdate {
    ///     quantity: Some(2),
    ///     add_quantity: Some(3),
    ///     ..Default::default()
    /// });
    /// assert_eq!(item.quantity(), 5);
    /// ```
    pub fn apply_update(&mut self, update: &ItemUpdate) -> &mut Self {
        if let Some(quantity) = update.quantity {
            self.set_quantity(quantity);
        }
        if let Some(delta) = update.add_quantity {
            self.add_quantity(delta);
        }
        if let Some(attributes) = &update.attributes {
            self.attributes.merge_from(attributes);
        }
        if let Some(conditions) = &update.conditions {
            self.set_conditions(conditions);
        }

        debug!(item_id = %self.id, quantity = self.quantity, "Applied item update");
        self
    }

    /// Takes `id` as this line's id and re-owns its conditions accordingly.
    pub(crate) fn rebind(&mut self, id: ItemId) {
        if self.id != id {
            warn!(key = %id, stored = %self.id, "Rebinding item id to its key");
            self.id = id;
        }
        self.conditions.rebind(ConditionOwner::Item { item_id: id });
    }

    /// Binds a resolved unit price and number format for pricing.
    pub fn priced<'a>(&'a self, unit_price: f64, format: &'a NumberFormat) -> PricedItem<'a> {
        PricedItem {
            item: self,
            unit_price,
            format,
        }
    }
}

// =============================================================================
// Pricing View
// =============================================================================

/// An item together with its resolved unit price.
///
/// Every figure is rounded on its own, and later figures consume the rounded
/// value of earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct PricedItem<'a> {
    item: &'a Item,
    unit_price: f64,
    format: &'a NumberFormat,
}

impl<'a> PricedItem<'a> {
    pub fn item(&self) -> &'a Item {
        self.item
    }

    /// Unit price, rounded.
    pub fn price_without_conditions(&self) -> f64 {
        self.format.round(self.unit_price)
    }

    /// `quantity × price_without_conditions`, rounded.
    pub fn price_sum_without_conditions(&self) -> f64 {
        self.format
            .round(self.item.quantity as f64 * self.price_without_conditions())
    }

    /// Item conditions folded over the rounded unit price, rounded.
    pub fn price(&self) -> CoreResult<f64> {
        let folded = self.item.conditions.fold(self.price_without_conditions())?;
        Ok(self.format.round(folded))
    }

    /// `quantity × price`, rounded.
    pub fn price_sum(&self) -> CoreResult<f64> {
        Ok(self.format.round(self.item.quantity as f64 * self.price()?))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> Item {
        Item::new(ItemId::new(id).unwrap())
    }

    #[test]
    fn test_new_item_is_empty_line() {
        let item = item(4);
        assert_eq!(item.quantity(), 0);
        assert!(item.attributes().is_empty());
        assert!(item.is_empty_conditions());
    }

    #[test]
    fn test_add_quantity_clamps_at_zero() {
        let mut item = item(1);
        item.set_quantity(2).add_quantity(3);
        assert_eq!(item.quantity(), 5);

        item.add_quantity(-10);
        assert_eq!(item.quantity(), 0);
    }

    #[test]
    fn test_item_conditions_carry_owner() {
        let mut item = item(9);
        let condition = item.condition("sale");
        assert_eq!(
            condition.owner(),
            ConditionOwner::Item {
                item_id: ItemId::new(9).unwrap()
            }
        );
    }

    #[test]
    fn test_remove_and_clear_conditions() {
        let mut item = item(1);
        item.condition("a");
        item.condition("b");

        item.remove_condition("a").remove_condition("missing");
        assert!(!item.has_condition("a"));
        assert!(item.has_condition("b"));

        item.clear_conditions();
        assert!(item.is_empty_conditions());
    }

    #[test]
    fn test_apply_update() {
        let mut item = item(1);
        item.merge_attributes([("color", "green")]);

        item.apply_update(&ItemUpdate {
            quantity: Some(1),
            add_quantity: Some(1),
            attributes: Some([("size", "M")].into_iter().collect()),
            conditions: Some(vec![ConditionInput::new("sale").kind("sale").value("-10%")]),
        });

        assert_eq!(item.quantity(), 2);
        assert_eq!(item.attributes().get("size").unwrap(), "M");
        assert_eq!(item.attributes().get("color").unwrap(), "green");
        assert_eq!(item.conditions().get("sale").unwrap().value(), "-10%");
    }

    #[test]
    fn test_update_deserializes_from_json() {
        let update: ItemUpdate = serde_json::from_str(
            r#"{ "add_quantity": -1, "conditions": [{ "name": "bonus", "value": "+2" }] }"#,
        )
        .unwrap();

        assert_eq!(update.quantity, None);
        assert_eq!(update.add_quantity, Some(-1));
        assert_eq!(update.conditions.unwrap()[0].kind, None);
    }

    #[test]
    fn test_pricing_cascade() {
        let format = NumberFormat::default();
        let mut item = item(1);
        item.set_quantity(2);
        item.condition("discount").set_value("-2");

        let priced = item.priced(5.24, &format);
        assert_eq!(priced.price_without_conditions(), 5.24);
        assert_eq!(priced.price_sum_without_conditions(), 10.48);
        assert_eq!(priced.price().unwrap(), 3.24);
        assert_eq!(priced.price_sum().unwrap(), 6.48);
    }

    #[test]
    fn test_price_rounds_after_fold() {
        let format = NumberFormat::default();
        let mut item = item(1);
        item.set_quantity(1);
        item.condition("sale").set_value("10%");
        item.condition("coupon").set_value("-1");

        // 5.24 * 1.1 - 1 = 4.764
        assert_eq!(item.priced(5.24, &format).price().unwrap(), 4.76);
    }

    #[test]
    fn test_disabled_format_keeps_raw_values() {
        let format = NumberFormat::Disabled;
        let mut item = item(1);
        item.set_quantity(3);
        item.condition("sale").set_value("10%");

        let priced = item.priced(1.111, &format);
        assert_eq!(priced.price_without_conditions(), 1.111);
        assert!((priced.price().unwrap() - 1.2221).abs() < 1e-12);
        assert!((priced.price_sum().unwrap() - 3.6663).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_condition_value_propagates() {
        let format = NumberFormat::default();
        let mut item = item(1);
        item.set_quantity(1);
        item.condition("broken").set_value("abc");

        assert!(item.priced(1.0, &format).price_sum().is_err());
    }
}
