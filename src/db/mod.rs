//! Persistence for customers, stores, items and orders.
//!
//! # Tables
//!
//! - `customers` - shopper accounts (phone and email unique)
//! - `stores` - seller accounts (phone and email unique)
//! - `items` - catalog entries, owned by a store
//! - `orders` - immutable order snapshots
//!
//! Two backends implement [`Database`]: [`PgDatabase`] for deployments and
//! [`MemoryDatabase`] for tests and local runs without `DATABASE_URL`.

mod memory;
mod postgres;

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::aggregates::{Customer, Item, Order, Store};
use crate::domain::value_objects::{Category, CustomerId, ItemId, StoreId};

/// Errors raised by a [`Database`] backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique field (phone, email) is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be turned back into a domain value.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepositoryError>;
    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, RepositoryError>;
    async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;

    async fn insert_store(&self, store: &Store) -> Result<(), RepositoryError>;
    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;
    async fn store_by_phone(&self, phone: &str) -> Result<Option<Store>, RepositoryError>;
    async fn store_by_email(&self, email: &str) -> Result<Option<Store>, RepositoryError>;
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;
    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError>;

    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError>;
    async fn item_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError>;
    /// Updates the item only when it still belongs to `item.store_id()`. Returns whether a row changed.
    async fn update_item(&self, item: &Item) -> Result<bool, RepositoryError>;
    /// Deletes the item only when owned by `store_id`. Returns whether a row was removed.
    async fn delete_item(&self, id: ItemId, store_id: StoreId) -> Result<bool, RepositoryError>;
    async fn items_by_store(&self, store_id: StoreId) -> Result<Vec<Item>, RepositoryError>;
    /// `None` lists every item.
    async fn items_by_category(&self, category: Option<Category>) -> Result<Vec<Item>, RepositoryError>;

    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError>;
    /// Newest first.
    async fn orders_for_customer(&self, id: CustomerId) -> Result<Vec<Order>, RepositoryError>;
    async fn orders_for_store_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<Order>, RepositoryError>;
}
