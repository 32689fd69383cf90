//! Serializable view models. Money is sent as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{cart, Cart, CartItem, Item, Order, OrderItem, Store};
use crate::domain::value_objects::{Category, ItemId, OrderId, StoreId};
use crate::services::catalog::CatalogEntry;

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub store_id: StoreId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub category: Category,
    /// `data:` URL of the image, if any.
    pub photo: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id(),
            store_id: item.store_id(),
            name: item.name().to_string(),
            price: item.price().amount(),
            description: item.description().to_string(),
            category: item.category(),
            photo: item.image().map(|img| img.data_url()),
            updated_at: item.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogItemView {
    #[serde(flatten)]
    pub item: ItemView,
    pub store_owner: String,
}

impl From<&CatalogEntry> for CatalogItemView {
    fn from(entry: &CatalogEntry) -> Self {
        Self { item: ItemView::from(&entry.item), store_owner: entry.store_name.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct StoreCard {
    pub id: StoreId,
    pub store_name: String,
    pub owner_name: String,
    pub address: String,
}

impl From<&Store> for StoreCard {
    fn from(store: &Store) -> Self {
        Self { id: store.id, store_name: store.store_name.clone(), owner_name: store.owner_name.clone(), address: store.address.summary() }
    }
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: ItemId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub store_id: StoreId,
}

impl From<&CartItem> for CartLineView {
    fn from(line: &CartItem) -> Self {
        Self { id: line.id, name: line.name.clone(), price: line.price, quantity: line.quantity, subtotal: line.line_total(), store_id: line.store_id }
    }
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

impl From<&Cart> for CartView {
    fn from(c: &Cart) -> Self {
        let total = c.total();
        Self {
            items: c.items().iter().map(CartLineView::from).collect(),
            total,
            delivery_fee: cart::DELIVERY_FEE,
            tax: cart::tax(total),
            grand_total: cart::grand_total(total),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub product_id: ItemId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl From<&OrderItem> for OrderLineView {
    fn from(i: &OrderItem) -> Self {
        Self { product_id: i.product_id, name: i.name.clone(), quantity: i.quantity, unit_price: i.unit_price }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub items: Vec<OrderLineView>,
    pub summary: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub address: String,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id(),
            items: o.items().iter().map(OrderLineView::from).collect(),
            summary: o.item_summary(),
            total_amount: o.total_amount(),
            payment_method: o.payment_method().map(str::to_string),
            address: o.address().summary(),
            placed_at: o.placed_at(),
        }
    }
}
