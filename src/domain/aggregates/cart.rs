//! Cart Aggregate
//!
//! The cart lives in the shopper's session, not in the database. Prices are
//! snapshotted when a line is first added and are not refreshed afterwards.
//!
//! Item prices are capped at [`MAX_PRICE`](crate::domain::value_objects::MAX_PRICE) and line quantities at
//! [`MAX_QUANTITY`], which keeps every total far inside `Decimal`'s range.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Item;
use crate::domain::value_objects::{ItemId, StoreId};

/// Flat delivery fee added to every checkout.
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

/// Largest quantity a single cart line can hold.
pub const MAX_QUANTITY: u32 = 10_000;

/// Largest grand total a session may record for checkout.
pub const MAX_GRAND_TOTAL: i64 = 1_000_000_000_000_000;

/// Tax rate applied to the cart total (5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub store_id: StoreId,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// Result of a single-line quantity change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityChange {
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Result of removing a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removal {
    pub total: Decimal,
    pub remaining: usize,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds one unit of `item`, merging into an existing line for the same id.
    pub fn add(&mut self, item: &Item) -> &CartItem {
        let idx = match self.items.iter().position(|i| i.id == item.id()) {
            Some(idx) => {
                let line = &mut self.items[idx];
                line.quantity = line.quantity.saturating_add(1).min(MAX_QUANTITY);
                idx
            }
            None => {
                self.items.push(CartItem {
                    id: item.id(),
                    name: item.name().to_string(),
                    price: item.price().amount(),
                    quantity: 1,
                    store_id: item.store_id(),
                });
                self.items.len() - 1
            }
        };
        &self.items[idx]
    }

    /// Overwrites the quantity of one line. `quantity` must be a whole number
    /// in `1..=MAX_QUANTITY`.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: i64) -> Result<QuantityChange, CartError> {
        let quantity = u32::try_from(quantity).ok().filter(|q| (1..=MAX_QUANTITY).contains(q)).ok_or(CartError::InvalidQuantity)?;
        let line = self.items.iter_mut().find(|i| i.id == item_id).ok_or(CartError::ItemNotInCart)?;
        line.quantity = quantity;
        let subtotal = line.line_total();
        Ok(QuantityChange { subtotal, total: self.total() })
    }

    /// Applies form-submitted quantities. Values that are not positive whole
    /// numbers become 1, values above [`MAX_QUANTITY`] are capped; ids not in
    /// the cart are ignored.
    pub fn bulk_set_quantities(&mut self, quantities: &HashMap<ItemId, String>) {
        for line in &mut self.items {
            if let Some(raw) = quantities.get(&line.id) {
                line.quantity = match raw.trim().parse::<i64>() {
                    Ok(q) if q >= 1 => u32::try_from(q).unwrap_or(MAX_QUANTITY).min(MAX_QUANTITY),
                    _ => 1,
                };
            }
        }
    }

    /// Removes the line for `item_id` if present.
    pub fn remove(&mut self, item_id: ItemId) -> Removal {
        self.items.retain(|i| i.id != item_id);
        Removal { total: self.total(), remaining: self.items.len() }
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total(&self) -> Decimal { self.items.iter().map(CartItem::line_total).sum() }
}

/// Tax on a cart total.
pub fn tax(total: Decimal) -> Decimal { total * TAX_RATE }

/// Cart total plus delivery fee plus tax.
pub fn grand_total(total: Decimal) -> Decimal { total + DELIVERY_FEE + tax(total) }

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Invalid quantity")]
    InvalidQuantity,
    #[error("Item not found in cart")]
    ItemNotInCart,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Category, Price, MAX_PRICE};

    fn item(name: &str, price: Decimal) -> Item {
        let (item, _) = Item::create(StoreId::new(), name, Price::new(price).unwrap(), "", Category::Pizza, None);
        item
    }

    fn line(id: ItemId, price: i64, quantity: u32) -> CartItem {
        CartItem { id, name: "x".into(), price: Decimal::from(price), quantity, store_id: StoreId::new() }
    }

    #[test]
    fn test_repeated_add_merges() {
        let mut cart = Cart::new();
        let margherita = item("Margherita", Decimal::new(10, 0));
        for _ in 0..5 {
            cart.add(&margherita);
        }
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), Decimal::new(50, 0));
    }

    #[test]
    fn test_add_snapshots_price() {
        let mut cart = Cart::new();
        let mut cola = item("Cola", Decimal::new(250, 2));
        cart.add(&cola);
        cola.update("Cola", Price::new(Decimal::new(300, 2)).unwrap(), "");
        cart.add(&cola);
        assert_eq!(cart.items()[0].price, Decimal::new(250, 2));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_scenario_grand_total() {
        let (a, b) = (ItemId::new(), ItemId::new());
        let cart = Cart { items: vec![line(a, 10, 2), line(b, 5, 1)] };
        assert_eq!(cart.total(), Decimal::new(25, 0));
        assert_eq!(grand_total(cart.total()), Decimal::new(6625, 2));
    }

    #[test]
    fn test_grand_total_formula() {
        for cents in [0_i64, 1, 999, 2500, 123_456] {
            let total = Decimal::new(cents, 2);
            assert_eq!(grand_total(total), total + Decimal::from(40) + total * Decimal::new(5, 2));
        }
        assert_eq!(grand_total(Decimal::ZERO), Decimal::from(40));
    }

    #[test]
    fn test_set_quantity() {
        let (a, b) = (ItemId::new(), ItemId::new());
        let mut cart = Cart { items: vec![line(a, 10, 2), line(b, 5, 1)] };
        let change = cart.set_quantity(b, 4).unwrap();
        assert_eq!(change.subtotal, Decimal::from(20));
        assert_eq!(change.total, Decimal::from(40));
        assert_eq!(cart.set_quantity(a, 0), Err(CartError::InvalidQuantity));
        assert_eq!(cart.set_quantity(a, -3), Err(CartError::InvalidQuantity));
        assert_eq!(cart.set_quantity(ItemId::new(), 2), Err(CartError::ItemNotInCart));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_quantity_is_capped() {
        let a = ItemId::new();
        let mut cart = Cart { items: vec![line(a, MAX_PRICE, 1)] };
        assert_eq!(cart.set_quantity(a, i64::from(MAX_QUANTITY) + 1), Err(CartError::InvalidQuantity));
        assert_eq!(cart.set_quantity(a, i64::from(u32::MAX)), Err(CartError::InvalidQuantity));

        let change = cart.set_quantity(a, i64::from(MAX_QUANTITY)).unwrap();
        assert_eq!(change.subtotal, Decimal::from(MAX_PRICE) * Decimal::from(MAX_QUANTITY));
        assert!(grand_total(change.total) > change.total);

        cart.bulk_set_quantities(&HashMap::from([(a, "99999999999".to_string())]));
        assert_eq!(cart.items()[0].quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_add_stops_at_max_quantity() {
        let margherita = item("Margherita", Decimal::from(MAX_PRICE));
        let mut cart = Cart { items: vec![CartItem { quantity: MAX_QUANTITY, ..line(margherita.id(), MAX_PRICE, 1) }] };
        assert_eq!(cart.add(&margherita).quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_bulk_set_clamps() {
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        let mut cart = Cart { items: vec![line(a, 10, 2), line(b, 5, 3), line(c, 1, 7)] };
        let quantities = HashMap::from([(a, "0".to_string()), (b, "abc".to_string()), (ItemId::new(), "9".to_string())]);
        cart.bulk_set_quantities(&quantities);
        assert_eq!(cart.items()[0].quantity, 1);
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.items()[2].quantity, 7);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let a = ItemId::new();
        let mut cart = Cart { items: vec![line(a, 10, 2)] };
        assert_eq!(cart.remove(ItemId::new()), Removal { total: Decimal::from(20), remaining: 1 });
        assert_eq!(cart.remove(a), Removal { total: Decimal::ZERO, remaining: 0 });
        assert!(cart.is_empty());
    }

    #[test]
    fn test_session_round_trip_keeps_exact_prices() {
        let mut cart = Cart::new();
        cart.add(&item("Garlic Bread", Decimal::new(1099, 2)));
        let stored = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, cart);
    }
}
