//! Aggregates module
pub mod account;
pub mod item;
pub mod order;
pub mod cart;

pub use account::{Customer, CustomerProfile, Store, StoreProfile};
pub use item::{ImageChange, Item};
pub use order::{Order, OrderError, OrderItem};
pub use cart::{Cart, CartError, CartItem};
