//! Catalog browsing for customers.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::auth::CurrentCustomer;
use super::customer::DASHBOARD;
use super::pages::{page, redirect_with_error, redirect_with_flash, PageView};
use super::views::{CatalogItemView, ItemView, StoreCard};
use crate::domain::value_objects::StoreId;
use crate::error::Result;
use crate::services::catalog;
use crate::session::{FlashLevel, ShopperSession};
use crate::state::AppState;

#[derive(Serialize)]
pub struct StorePage {
    store: StoreCard,
    items: Vec<ItemView>,
}

/// One store's items. Unknown or malformed ids go back to the dashboard.
pub async fn store_items(State(state): State<AppState>, session: ShopperSession, CurrentCustomer(_): CurrentCustomer, Path(store_id): Path<String>) -> Response {
    let Ok(id) = store_id.parse::<StoreId>() else {
        return redirect_with_flash(&session, DASHBOARD, FlashLevel::Danger, "Store not found.").await;
    };
    let store = match state.db.store_by_id(id).await {
        Ok(Some(store)) => store,
        Ok(None) => return redirect_with_flash(&session, DASHBOARD, FlashLevel::Danger, "Store not found.").await,
        Err(e) => return redirect_with_error(&session, DASHBOARD, e.into()).await,
    };
    match state.db.items_by_store(store.id).await {
        Ok(items) => page(&session, StorePage { store: StoreCard::from(&store), items: items.iter().map(ItemView::from).collect() }).await.into_response(),
        Err(e) => redirect_with_error(&session, DASHBOARD, e.into()).await,
    }
}

#[derive(Serialize)]
pub struct CategoryPage {
    category: String,
    items: Vec<CatalogItemView>,
}

pub async fn category_page(State(state): State<AppState>, session: ShopperSession, Path(name): Path<String>) -> Result<Json<PageView<CategoryPage>>> {
    let entries = catalog::browse_category(state.db.as_ref(), &name).await?;
    page(&session, CategoryPage { category: name, items: entries.iter().map(CatalogItemView::from).collect() }).await
}

pub async fn api_category(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>> {
    let entries = catalog::browse_category(state.db.as_ref(), &name).await?;
    let items: Vec<CatalogItemView> = entries.iter().map(CatalogItemView::from).collect();
    Ok(Json(json!({ "success": true, "items": items })))
}
