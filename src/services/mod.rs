//! Application services. Each takes the database and event publisher
//! explicitly; session handling stays in the routes.

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod events;
pub mod sales;

pub use events::EventPublisher;

#[cfg(test)]
pub(crate) mod testing {
    use rust_decimal::Decimal;

    use crate::db::{Database, MemoryDatabase};
    use crate::domain::aggregates::{Customer, Item, Store};
    use crate::domain::value_objects::{Address, Category, Price};

    fn address() -> Address {
        Address { flat_no: "12".into(), street: "Park Street".into(), landmark: "Metro".into(), city: "Kolkata".into(), state: "WB".into(), pincode: "700016".into() }
    }

    pub async fn seed_store(db: &MemoryDatabase, phone: &str) -> Store {
        let (store, _) = Store::register(format!("Store {phone}"), "Owner".into(), phone.into(), format!("{phone}@stores.test"), String::new(), address());
        db.insert_store(&store).await.unwrap();
        store
    }

    pub async fn seed_customer(db: &MemoryDatabase, phone: &str) -> Customer {
        let (customer, _) = Customer::register("Nisha".into(), phone.into(), format!("{phone}@customers.test"), String::new(), address());
        db.insert_customer(&customer).await.unwrap();
        customer
    }

    pub async fn seed_item(db: &MemoryDatabase, store: &Store, name: &str, price: i64) -> Item {
        let (item, _) = Item::create(store.id, name, Price::new(Decimal::from(price)).unwrap(), "", Category::Pizza, None);
        db.insert_item(&item).await.unwrap();
        item
    }
}
