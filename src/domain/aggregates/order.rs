//! Order Aggregate
//!
//! Orders are snapshots: the customer's name and address and each cart line
//! are copied in at placement time and never change afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Cart, Customer};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Address, CustomerId, ItemId, OrderId, StoreId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: CustomerId,
    name: String,
    address: Address,
    items: Vec<OrderItem>,
    store_ids: Vec<StoreId>,
    total_amount: Decimal,
    payment_method: Option<String>,
    placed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub store_id: StoreId,
}

impl Order {
    /// Builds an order from the cart. `total_amount` is the grand total the
    /// shopper was shown, not a recomputation.
    pub fn place(customer: &Customer, cart: &Cart, total_amount: Decimal, payment_method: Option<String>, placed_at: DateTime<Utc>) -> Result<(Self, DomainEvent), OrderError> {
        if cart.is_empty() { return Err(OrderError::NoItems); }
        let items: Vec<OrderItem> = cart.items().iter().map(|line| OrderItem {
            product_id: line.id, name: line.name.clone(), quantity: line.quantity,
            unit_price: line.price, store_id: line.store_id,
        }).collect();
        let mut store_ids: Vec<StoreId> = items.iter().map(|i| i.store_id).collect();
        store_ids.sort();
        store_ids.dedup();
        let order = Self {
            id: OrderId::new(), user_id: customer.id, name: customer.name.clone(), address: customer.address.clone(),
            items, store_ids, total_amount,
            payment_method: payment_method.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
            placed_at,
        };
        let event = DomainEvent::Order(OrderEvent::Placed { order_id: order.id, customer_id: order.user_id, total: total_amount, item_count: order.items.len() });
        Ok((order, event))
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(id: OrderId, user_id: CustomerId, name: String, address: Address, items: Vec<OrderItem>, store_ids: Vec<StoreId>, total_amount: Decimal, payment_method: Option<String>, placed_at: DateTime<Utc>) -> Self {
        Self { id, user_id, name, address, items, store_ids, total_amount, payment_method, placed_at }
    }

    pub fn id(&self) -> OrderId { self.id }
    pub fn user_id(&self) -> CustomerId { self.user_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn address(&self) -> &Address { &self.address }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn store_ids(&self) -> &[StoreId] { &self.store_ids }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn payment_method(&self) -> Option<&str> { self.payment_method.as_deref() }
    pub fn placed_at(&self) -> DateTime<Utc> { self.placed_at }

    pub fn includes_store(&self, store_id: StoreId) -> bool { self.store_ids.contains(&store_id) }

    /// "Margherita × 2, Cola × 1"
    pub fn item_summary(&self) -> String {
        self.items.iter().map(|i| format!("{} × {}", i.name, i.quantity)).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Your cart is empty")]
    NoItems,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Item;
    use crate::domain::value_objects::{Category, Price};

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(), name: "Asha".into(), phone: "9000000001".into(), email: "asha@example.com".into(),
            pin_hash: String::new(),
            address: Address { flat_no: "4B".into(), street: "Hill Rd".into(), landmark: "Temple".into(), city: "Mumbai".into(), state: "MH".into(), pincode: "400050".into() },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(Order::place(&customer(), &Cart::new(), Decimal::ZERO, None, Utc::now()).unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_order_snapshots_cart_and_customer() {
        let (store_a, store_b) = (StoreId::new(), StoreId::new());
        let (pizza, _) = Item::create(store_a, "Margherita", Price::new(Decimal::from(10)).unwrap(), "", Category::Pizza, None);
        let (cola, _) = Item::create(store_b, "Cola", Price::new(Decimal::from(5)).unwrap(), "", Category::Beverage, None);
        let (bread, _) = Item::create(store_a, "Garlic Bread", Price::new(Decimal::from(3)).unwrap(), "", Category::Breads, None);
        let mut cart = Cart::new();
        cart.add(&pizza);
        cart.add(&pizza);
        cart.add(&cola);
        cart.add(&bread);

        let mut c = customer();
        let (order, event) = Order::place(&c, &cart, Decimal::new(6625, 2), Some(" upi ".into()), Utc::now()).unwrap();
        c.address.city = "Pune".into();

        assert_eq!(order.items().len(), 3);
        assert_eq!(order.items()[0].quantity, 2);
        assert_eq!(order.items()[0].unit_price, Decimal::from(10));
        assert_eq!(order.address().city, "Mumbai");
        assert_eq!(order.payment_method(), Some("upi"));
        assert_eq!(order.store_ids().len(), 2);
        assert!(order.includes_store(store_a) && order.includes_store(store_b));
        assert_eq!(order.item_summary(), "Margherita × 2, Cola × 1, Garlic Bread × 1");
        assert!(matches!(event, DomainEvent::Order(OrderEvent::Placed { item_count: 3, .. })));
    }
}
