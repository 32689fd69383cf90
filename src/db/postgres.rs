//! `PostgreSQL` backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Database, RepositoryError};
use crate::domain::aggregates::{Customer, Item, Order, OrderItem, Store};
use crate::domain::value_objects::{Address, Category, CustomerId, ItemId, ItemImage, OrderId, Price, StoreId};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool { &self.pool }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow { id: Uuid, name: String, phone: String, email: String, pin_hash: String, address: Json<Address>, created_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct StoreRow { id: Uuid, store_name: String, owner_name: String, phone: String, email: String, password_hash: String, address: Json<Address>, created_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid, store_id: Uuid, name: String, price: Decimal, description: String, category: String,
    image_content_type: Option<String>, image_data: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: Uuid, name: String, address: Json<Address>, items: Json<Vec<OrderItem>>, store_ids: Vec<Uuid>,
    total_amount: Decimal, payment_method: Option<String>, placed_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Self { id: CustomerId::from_uuid(r.id), name: r.name, phone: r.phone, email: r.email, pin_hash: r.pin_hash, address: r.address.0, created_at: r.created_at }
    }
}

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Self {
            id: StoreId::from_uuid(r.id), store_name: r.store_name, owner_name: r.owner_name, phone: r.phone,
            email: r.email, password_hash: r.password_hash, address: r.address.0, created_at: r.created_at,
        }
    }
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        let category = r.category.parse::<Category>().map_err(|e| RepositoryError::DataCorruption(format!("item {}: {e}", r.id)))?;
        let price = Price::new(r.price).map_err(|e| RepositoryError::DataCorruption(format!("item {}: {e}", r.id)))?;
        let image = match (r.image_content_type, r.image_data) {
            (Some(content_type), Some(data)) => Some(ItemImage::from_stored(content_type, data)),
            _ => None,
        };
        Ok(Item::restore(ItemId::from_uuid(r.id), StoreId::from_uuid(r.store_id), r.name, price, r.description, category, image, r.created_at, r.updated_at))
    }
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Order::restore(
            OrderId::from_uuid(r.id), CustomerId::from_uuid(r.user_id), r.name, r.address.0, r.items.0,
            r.store_ids.into_iter().map(StoreId::from_uuid).collect(), r.total_amount, r.payment_method, r.placed_at,
        )
    }
}

fn map_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let field = db.constraint().map_or("phone or email", |c| if c.contains("email") { "email" } else if c.contains("phone") { "phone" } else { "phone or email" });
            RepositoryError::Conflict(format!("{what} with this {field} already exists"))
        }
        _ => RepositoryError::Database(e),
    }
}

fn items(rows: Vec<ItemRow>) -> Result<Vec<Item>, RepositoryError> {
    rows.into_iter().map(Item::try_from).collect()
}

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, pin_hash, address, created_at";
const STORE_COLUMNS: &str = "id, store_name, owner_name, phone, email, password_hash, address, created_at";
const ITEM_COLUMNS: &str = "id, store_id, name, price, description, category, image_content_type, image_data, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, name, address, items, store_ids, total_amount, payment_method, placed_at";

#[async_trait]
impl Database for PgDatabase {
    async fn insert_customer(&self, c: &Customer) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO customers (id, name, phone, email, pin_hash, address, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(c.id.as_uuid()).bind(&c.name).bind(&c.phone).bind(&c.email).bind(&c.pin_hash).bind(Json(&c.address)).bind(c.created_at)
            .execute(&self.pool).await.map_err(|e| map_unique(e, "An account"))?;
        Ok(())
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(row.map(Customer::from))
    }

    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = $1"))
            .bind(phone).fetch_optional(&self.pool).await?;
        Ok(row.map(Customer::from))
    }

    async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"))
            .bind(email).fetch_optional(&self.pool).await?;
        Ok(row.map(Customer::from))
    }

    async fn insert_store(&self, s: &Store) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO stores (id, store_name, owner_name, phone, email, password_hash, address, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(s.id.as_uuid()).bind(&s.store_name).bind(&s.owner_name).bind(&s.phone).bind(&s.email).bind(&s.password_hash).bind(Json(&s.address)).bind(s.created_at)
            .execute(&self.pool).await.map_err(|e| map_unique(e, "A store"))?;
        Ok(())
    }

    async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"))
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        Ok(row.map(Store::from))
    }

    async fn store_by_phone(&self, phone: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE phone = $1"))
            .bind(phone).fetch_optional(&self.pool).await?;
        Ok(row.map(Store::from))
    }

    async fn store_by_email(&self, email: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE email = $1"))
            .bind(email).fetch_optional(&self.pool).await?;
        Ok(row.map(Store::from))
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores ORDER BY store_name"))
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(StoreId::as_uuid).collect();
        let rows = sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ANY($1)"))
            .bind(&ids).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO items (id, store_id, name, price, description, category, image_content_type, image_data, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(item.id().as_uuid()).bind(item.store_id().as_uuid()).bind(item.name()).bind(item.price().amount())
            .bind(item.description()).bind(item.category().as_str())
            .bind(item.image().map(ItemImage::content_type)).bind(item.image().map(ItemImage::data))
            .bind(item.created_at()).bind(item.updated_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn item_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        row.map(Item::try_from).transpose()
    }

    async fn update_item(&self, item: &Item) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE items SET name = $3, price = $4, description = $5, image_content_type = $6, image_data = $7, updated_at = $8 WHERE id = $1 AND store_id = $2")
            .bind(item.id().as_uuid()).bind(item.store_id().as_uuid()).bind(item.name()).bind(item.price().amount())
            .bind(item.description()).bind(item.image().map(ItemImage::content_type)).bind(item.image().map(ItemImage::data))
            .bind(item.updated_at())
            .execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_item(&self, id: ItemId, store_id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND store_id = $2")
            .bind(id.as_uuid()).bind(store_id.as_uuid()).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn items_by_store(&self, store_id: StoreId) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE store_id = $1 ORDER BY created_at"))
            .bind(store_id.as_uuid()).fetch_all(&self.pool).await?;
        items(rows)
    }

    async fn items_by_category(&self, category: Option<Category>) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE $1::TEXT IS NULL OR category = $1 ORDER BY created_at"))
            .bind(category.map(|c| c.as_str())).fetch_all(&self.pool).await?;
        items(rows)
    }

    async fn insert_order(&self, o: &Order) -> Result<(), RepositoryError> {
        let store_ids: Vec<Uuid> = o.store_ids().iter().map(StoreId::as_uuid).collect();
        sqlx::query("INSERT INTO orders (id, user_id, name, address, items, store_ids, total_amount, payment_method, placed_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
            .bind(o.id().as_uuid()).bind(o.user_id().as_uuid()).bind(o.name()).bind(Json(o.address())).bind(Json(o.items()))
            .bind(&store_ids).bind(o.total_amount()).bind(o.payment_method()).bind(o.placed_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn orders_for_customer(&self, id: CustomerId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY placed_at DESC"))
            .bind(id.as_uuid()).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn orders_for_store_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE $1 = ANY(store_ids) AND placed_at >= $2 ORDER BY placed_at DESC"))
            .bind(store_id.as_uuid()).bind(since).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }
}
