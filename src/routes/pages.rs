//! Page responses.
//!
//! Rendering happens outside this service: a page route answers with its
//! view model as JSON, including any pending flash messages. Form posts end
//! in a redirect with a flash.

use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{Result, StorefrontError};
use crate::session::{Flash, FlashLevel, ShopperSession};

#[derive(Debug, Serialize)]
pub struct PageView<T> {
    pub flashes: Vec<Flash>,
    #[serde(flatten)]
    pub data: T,
}

/// A page with nothing but its flash messages, e.g. a login form.
#[derive(Debug, Serialize)]
pub struct Blank {}

pub async fn page<T: Serialize>(session: &ShopperSession, data: T) -> Result<Json<PageView<T>>> {
    Ok(Json(PageView { flashes: session.take_flashes().await?, data }))
}

pub async fn redirect_with_flash(session: &ShopperSession, to: &str, level: FlashLevel, message: impl Into<String>) -> Response {
    if let Err(e) = session.flash(level, message).await {
        warn!(error = %e, "failed to store flash message");
    }
    Redirect::to(to).into_response()
}

/// Shows `err` as a danger flash on the page at `to`.
pub async fn redirect_with_error(session: &ShopperSession, to: &str, err: StorefrontError) -> Response {
    if err.status().is_server_error() {
        error!(error = %err, "request failed");
    }
    redirect_with_flash(session, to, FlashLevel::Danger, err.public_message()).await
}
