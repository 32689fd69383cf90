//! Typed access to the shopper's server-side session.
//!
//! The session is held by `tower-sessions` and keyed by the session cookie.
//! With PostgreSQL configured the records live in the database next to the
//! rest of the data; otherwise they are kept in process memory.
//! Every handler gets its own [`ShopperSession`]; nothing here is global.
//! Cart updates are read-modify-write, so two tabs racing on the same
//! session can lose an update.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use crate::config::Config;
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::{CustomerId, StoreId};
use crate::error::Result;

pub const SESSION_COOKIE_NAME: &str = "storefront_session";

/// Inactivity expiry (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session keys.
pub mod keys {
    pub const CUSTOMER: &str = "customer";
    pub const STORE: &str = "store";
    pub const CART: &str = "cart";
    pub const GRAND_TOTAL: &str = "grand_total";
    pub const FLASH: &str = "flash";
}

/// How often expired session records are purged from PostgreSQL.
pub const EXPIRED_SESSION_SWEEP_SECONDS: u64 = 60;

pub fn create_session_layer<S: SessionStore + Clone>(store: S, config: &Config) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(config.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// One-shot message shown on the next page view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ShopperSession(Session);

#[async_trait]
impl<S> FromRequestParts<S> for ShopperSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session layer missing"))
    }
}

impl ShopperSession {
    pub fn new(session: Session) -> Self { Self(session) }

    pub fn from_parts(parts: &Parts) -> Option<Self> {
        parts.extensions.get::<Session>().cloned().map(Self)
    }

    pub async fn customer_id(&self) -> Result<Option<CustomerId>> {
        Ok(self.0.get(keys::CUSTOMER).await?)
    }

    pub async fn login_customer(&self, id: CustomerId) -> Result<()> {
        self.0.cycle_id().await?;
        self.0.insert(keys::CUSTOMER, id).await?;
        Ok(())
    }

    /// Also drops the cart and pending grand total.
    pub async fn logout_customer(&self) -> Result<()> {
        self.0.remove_value(keys::CUSTOMER).await?;
        self.0.remove_value(keys::CART).await?;
        self.0.remove_value(keys::GRAND_TOTAL).await?;
        Ok(())
    }

    pub async fn store_id(&self) -> Result<Option<StoreId>> {
        Ok(self.0.get(keys::STORE).await?)
    }

    pub async fn login_store(&self, id: StoreId) -> Result<()> {
        self.0.cycle_id().await?;
        self.0.insert(keys::STORE, id).await?;
        Ok(())
    }

    pub async fn logout_store(&self) -> Result<()> {
        self.0.remove_value(keys::STORE).await?;
        Ok(())
    }

    /// `None` when no cart has been started in this session.
    pub async fn existing_cart(&self) -> Result<Option<Cart>> {
        Ok(self.0.get(keys::CART).await?)
    }

    pub async fn cart(&self) -> Result<Cart> {
        Ok(self.existing_cart().await?.unwrap_or_default())
    }

    pub async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.0.insert(keys::CART, cart).await?;
        Ok(())
    }

    pub async fn clear_cart(&self) -> Result<()> {
        self.0.remove_value(keys::CART).await?;
        self.0.remove_value(keys::GRAND_TOTAL).await?;
        Ok(())
    }

    /// The grand total last computed for this cart; zero if never computed.
    pub async fn grand_total(&self) -> Result<Decimal> {
        Ok(self.0.get(keys::GRAND_TOTAL).await?.unwrap_or(Decimal::ZERO))
    }

    pub async fn set_grand_total(&self, amount: Decimal) -> Result<()> {
        self.0.insert(keys::GRAND_TOTAL, amount).await?;
        Ok(())
    }

    pub async fn flash(&self, level: FlashLevel, message: impl Into<String>) -> Result<()> {
        let mut pending: Vec<Flash> = self.0.get(keys::FLASH).await?.unwrap_or_default();
        pending.push(Flash { level, message: message.into() });
        self.0.insert(keys::FLASH, pending).await?;
        Ok(())
    }

    pub async fn take_flashes(&self) -> Result<Vec<Flash>> {
        Ok(self.0.remove(keys::FLASH).await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use crate::domain::aggregates::Item;
    use crate::domain::value_objects::{Category, Price};

    fn session() -> ShopperSession {
        ShopperSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[tokio::test]
    async fn test_cart_defaults_to_empty() {
        let s = session();
        assert!(s.existing_cart().await.unwrap().is_none());
        assert!(s.cart().await.unwrap().is_empty());
        assert_eq!(s.grand_total().await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_cart_round_trip_and_logout() {
        let s = session();
        let (item, _) = Item::create(StoreId::new(), "Cola", Price::new(Decimal::new(4550, 2)).unwrap(), "", Category::Beverage, None);
        let mut cart = Cart::new();
        cart.add(&item);
        s.save_cart(&cart).await.unwrap();
        s.set_grand_total(Decimal::new(8777, 2)).await.unwrap();
        s.login_customer(CustomerId::new()).await.unwrap();

        assert_eq!(s.cart().await.unwrap(), cart);
        assert_eq!(s.grand_total().await.unwrap(), Decimal::new(8777, 2));

        s.logout_customer().await.unwrap();
        assert!(s.customer_id().await.unwrap().is_none());
        assert!(s.existing_cart().await.unwrap().is_none());
        assert_eq!(s.grand_total().await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_flashes_are_one_shot() {
        let s = session();
        s.flash(FlashLevel::Success, "saved").await.unwrap();
        s.flash(FlashLevel::Danger, "oops").await.unwrap();
        let flashes = s.take_flashes().await.unwrap();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[1], Flash { level: FlashLevel::Danger, message: "oops".into() });
        assert!(s.take_flashes().await.unwrap().is_empty());
    }
}
