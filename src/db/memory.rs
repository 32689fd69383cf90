//! In-process backend. Enforces the same uniqueness rules as the SQL schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Database, RepositoryError};
use crate::domain::aggregates::{Customer, Item, Order, Store};
use crate::domain::value_objects::{Category, CustomerId, ItemId, StoreId};

#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    stores: HashMap<StoreId, Store>,
    items: HashMap<ItemId, Item>,
    orders: Vec<Order>,
}

impl MemoryDatabase {
    pub fn new() -> Self { Self::default() }

    pub async fn order_count(&self) -> usize { self.tables.read().await.orders.len() }
    pub async fn item_count(&self) -> usize { self.tables.read().await.items.len() }
    pub async fn customer_count(&self) -> usize { self.tables.read().await.customers.len() }
}

fn sorted_items<'a>(items: impl Iterator<Item = &'a Item>) -> Vec<Item> {
    let mut out: Vec<Item> = items.cloned().collect();
    out.sort_by_key(Item::created_at);
    out
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut t = self.tables.write().await;
        if t.customers.values().any(|c| c.email == customer.email) {
            return Err(RepositoryError::Conflict("An account with this email already exists".into()));
        }
        if t.customers.values().any(|c| c.phone == customer.phone) {
            return Err(RepositoryError::Conflict("An account with this phone already exists".into()));
        }
        t.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().await.customers.values().find(|c| c.phone == phone).cloned())
    }

    async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().await.customers.values().find(|c| c.email == email).cloned())
    }

    async fn insert_store(&self, store: &Store) -> Result<(), RepositoryError> {
        let mut t = self.tables.write().await;
        if t.stores.values().any(|s| s.phone == store.phone) {
            return Err(RepositoryError::Conflict("A store with this phone already exists".into()));
        }
        if t.stores.values().any(|s| s.email == store.email) {
            return Err(RepositoryError::Conflict("A store with this email already exists".into()));
        }
        t.stores.insert(store.id, store.clone());
        Ok(())
    }

    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        Ok(self.tables.read().await.stores.get(&id).cloned())
    }

    async fn store_by_phone(&self, phone: &str) -> Result<Option<Store>, RepositoryError> {
        Ok(self.tables.read().await.stores.values().find(|s| s.phone == phone).cloned())
    }

    async fn store_by_email(&self, email: &str) -> Result<Option<Store>, RepositoryError> {
        Ok(self.tables.read().await.stores.values().find(|s| s.email == email).cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let mut stores: Vec<Store> = self.tables.read().await.stores.values().cloned().collect();
        stores.sort_by(|a, b| a.store_name.cmp(&b.store_name));
        Ok(stores)
    }

    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        let t = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| t.stores.get(id).cloned()).collect())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError> {
        self.tables.write().await.items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn item_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn update_item(&self, item: &Item) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().await;
        match t.items.get_mut(&item.id()) {
            Some(existing) if existing.store_id() == item.store_id() => {
                *existing = item.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_item(&self, id: ItemId, store_id: StoreId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.write().await;
        if t.items.get(&id).is_some_and(|i| i.is_owned_by(store_id)) {
            t.items.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn items_by_store(&self, store_id: StoreId) -> Result<Vec<Item>, RepositoryError> {
        Ok(sorted_items(self.tables.read().await.items.values().filter(|i| i.is_owned_by(store_id))))
    }

    async fn items_by_category(&self, category: Option<Category>) -> Result<Vec<Item>, RepositoryError> {
        Ok(sorted_items(self.tables.read().await.items.values().filter(|i| category.map_or(true, |c| i.category() == c))))
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.tables.write().await.orders.push(order.clone());
        Ok(())
    }

    async fn orders_for_customer(&self, id: CustomerId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self.tables.read().await.orders.iter().filter(|o| o.user_id() == id).cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at()));
        Ok(orders)
    }

    async fn orders_for_store_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self.tables.read().await.orders.iter()
            .filter(|o| o.includes_store(store_id) && o.placed_at() >= since)
            .cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.placed_at()));
        Ok(orders)
    }
}
