//! Extractors that require a logged-in customer or store.
//!
//! Browser routes are redirected to the matching login page with a flash
//! message; JSON routes (and XHR calls) get a `{success:false}` body instead.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::domain::aggregates::{Customer, Store};
use crate::error::StorefrontError;
use crate::session::{FlashLevel, ShopperSession};
use crate::state::AppState;

pub const CUSTOMER_LOGIN: &str = "/customer/login";
pub const STORE_LOGIN: &str = "/store/login";

/// Non-`/api` paths that are called from scripts.
const JSON_PATHS: [&str; 2] = ["/place-order", "/customer/profile-data"];

const SESSION_INVALID: &str = "Your session is invalid. Please log in again.";

pub struct CurrentCustomer(pub Customer);

pub struct CurrentStore(pub Store);

pub enum AuthRejection {
    RedirectToLogin(&'static str),
    Api(StorefrontError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(to) => Redirect::to(to).into_response(),
            Self::Api(e) => e.into_response(),
        }
    }
}

impl From<StorefrontError> for AuthRejection {
    fn from(e: StorefrontError) -> Self { Self::Api(e) }
}

pub fn wants_json(parts: &Parts) -> bool {
    let path = parts.uri.path();
    path.starts_with("/api/") || JSON_PATHS.contains(&path) || is_xhr(&parts.headers)
}

pub fn is_xhr(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn session_of(parts: &Parts) -> Result<ShopperSession, AuthRejection> {
    ShopperSession::from_parts(parts).ok_or_else(|| StorefrontError::Internal("session layer missing".into()).into())
}

async fn reject(session: &ShopperSession, json: bool, login: &'static str, err: StorefrontError) -> AuthRejection {
    if json {
        return AuthRejection::Api(err);
    }
    if let Err(e) = session.flash(FlashLevel::Warning, err.to_string()).await {
        warn!(error = %e, "failed to store flash message");
    }
    AuthRejection::RedirectToLogin(login)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_of(parts)?;
        let json = wants_json(parts);
        let Some(id) = session.customer_id().await? else {
            return Err(reject(&session, json, CUSTOMER_LOGIN, StorefrontError::Unauthorized("Please log in to access this page.".into())).await);
        };
        match state.db.customer_by_id(id).await.map_err(StorefrontError::from)? {
            Some(customer) => Ok(Self(customer)),
            None => {
                warn!(customer_id = %id, "session refers to a missing customer");
                session.logout_customer().await?;
                Err(reject(&session, json, CUSTOMER_LOGIN, StorefrontError::NotFound(SESSION_INVALID.into())).await)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStore {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_of(parts)?;
        let json = wants_json(parts);
        let Some(id) = session.store_id().await? else {
            return Err(reject(&session, json, STORE_LOGIN, StorefrontError::Unauthorized("Please log in to access this page.".into())).await);
        };
        match state.db.store_by_id(id).await.map_err(StorefrontError::from)? {
            Some(store) => Ok(Self(store)),
            None => {
                warn!(store_id = %id, "session refers to a missing store");
                session.logout_store().await?;
                Err(reject(&session, json, STORE_LOGIN, StorefrontError::NotFound(SESSION_INVALID.into())).await)
            }
        }
    }
}
