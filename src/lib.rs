//! Storefront - multi-store food ordering service
//!
//! Customers browse stores and categories, keep a cart in their session and
//! place orders; stores manage their own catalog and see a seven-day sales
//! report. Persistence is `PostgreSQL` (or in-memory for local runs), and
//! domain events go to NATS when it is configured.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{Result, StorefrontError};
pub use routes::{router, router_with_session_store};
pub use state::AppState;
