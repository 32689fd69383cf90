//! Customer and store accounts

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::events::{AccountEvent, DomainEvent};
use crate::domain::value_objects::{Address, CustomerId, StoreId};

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// argon2 PHC string of the login PIN
    pub pin_hash: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    pub id: StoreId,
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: String,
    /// argon2 PHC string of the login password
    pub password_hash: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn register(name: String, phone: String, email: String, pin_hash: String, address: Address) -> (Self, DomainEvent) {
        let customer = Self { id: CustomerId::new(), name, phone, email, pin_hash, address, created_at: Utc::now() };
        let event = DomainEvent::Account(AccountEvent::CustomerRegistered { customer_id: customer.id });
        (customer, event)
    }

    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile { name: self.name.clone(), phone: self.phone.clone(), email: self.email.clone(), address: self.address.clone() }
    }
}

impl Store {
    pub fn register(store_name: String, owner_name: String, phone: String, email: String, password_hash: String, address: Address) -> (Self, DomainEvent) {
        let store = Self { id: StoreId::new(), store_name, owner_name, phone, email, password_hash, address, created_at: Utc::now() };
        let event = DomainEvent::Account(AccountEvent::StoreRegistered { store_id: store.id });
        (store, event)
    }

    pub fn profile(&self) -> StoreProfile {
        StoreProfile {
            id: self.id, store_name: self.store_name.clone(), owner_name: self.owner_name.clone(),
            phone: self.phone.clone(), email: self.email.clone(), address: self.address.clone(),
        }
    }
}

/// Customer fields safe to send to the browser.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Address,
}

/// Store fields safe to send to the browser.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreProfile {
    pub id: StoreId,
    pub store_name: String,
    pub owner_name: String,
    pub phone: String,
    pub email: String,
    pub address: Address,
}
