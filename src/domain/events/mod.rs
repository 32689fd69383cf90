//! Domain events
use crate::domain::value_objects::{CustomerId, ItemId, OrderId, StoreId};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Account(AccountEvent),
    Item(ItemEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccountEvent {
    CustomerRegistered { customer_id: CustomerId },
    StoreRegistered { store_id: StoreId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ItemEvent {
    Added { item_id: ItemId, store_id: StoreId },
    Updated { item_id: ItemId, store_id: StoreId },
    Deleted { item_id: ItemId, store_id: StoreId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, customer_id: CustomerId, total: Decimal, item_count: usize },
}

impl DomainEvent {
    /// Messaging subject, e.g. `storefront.order.placed`.
    pub fn subject(&self) -> String {
        let (aggregate, event) = match self {
            Self::Account(AccountEvent::CustomerRegistered { .. }) => ("customer", "registered"),
            Self::Account(AccountEvent::StoreRegistered { .. }) => ("store", "registered"),
            Self::Item(ItemEvent::Added { .. }) => ("item", "added"),
            Self::Item(ItemEvent::Updated { .. }) => ("item", "updated"),
            Self::Item(ItemEvent::Deleted { .. }) => ("item", "deleted"),
            Self::Order(OrderEvent::Placed { .. }) => ("order", "placed"),
        };
        format!("storefront.{aggregate}.{event}")
    }
}
