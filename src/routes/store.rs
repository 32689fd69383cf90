//! Store (seller) account and catalog management routes.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::FormRejection,
        Multipart, Path, State,
    },
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use super::auth::{CurrentStore, STORE_LOGIN};
use super::pages::{page, redirect_with_error, redirect_with_flash, Blank, PageView};
use super::views::ItemView;
use crate::domain::aggregates::StoreProfile;
use crate::error::{Result, StorefrontError};
use crate::services::accounts::{self, StoreLogin, StoreRegistration};
use crate::services::catalog::{self, ImageUpload, ItemSubmission};
use crate::services::sales::{self, DailySales};
use crate::session::{FlashLevel, ShopperSession};
use crate::state::AppState;

const DASHBOARD: &str = "/store/dashboard";
const REGISTER: &str = "/store/register";

pub async fn register_page(session: ShopperSession) -> Result<Json<PageView<Blank>>> {
    page(&session, Blank {}).await
}

#[instrument(skip_all)]
pub async fn register(State(state): State<AppState>, session: ShopperSession, form: std::result::Result<Form<StoreRegistration>, FormRejection>) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => return redirect_with_error(&session, REGISTER, e.into()).await,
    };
    match accounts::register_store(state.db.as_ref(), &state.events, form).await {
        Ok(_) => redirect_with_flash(&session, STORE_LOGIN, FlashLevel::Success, "Store registration successful! Please log in.").await,
        Err(e) => redirect_with_error(&session, REGISTER, e).await,
    }
}

pub async fn login_page(session: ShopperSession) -> Result<Json<PageView<Blank>>> {
    page(&session, Blank {}).await
}

#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: ShopperSession, form: std::result::Result<Form<StoreLogin>, FormRejection>) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => return redirect_with_error(&session, STORE_LOGIN, e.into()).await,
    };
    let store = match accounts::login_store(state.db.as_ref(), &form).await {
        Ok(store) => store,
        Err(e) => return redirect_with_error(&session, STORE_LOGIN, e).await,
    };
    if let Err(e) = session.login_store(store.id).await {
        return redirect_with_error(&session, STORE_LOGIN, e).await;
    }
    redirect_with_flash(&session, DASHBOARD, FlashLevel::Success, "Logged in successfully!").await
}

pub async fn logout(session: ShopperSession) -> Response {
    if let Err(e) = session.logout_store().await {
        return redirect_with_error(&session, STORE_LOGIN, e).await;
    }
    redirect_with_flash(&session, STORE_LOGIN, FlashLevel::Info, "Logged out successfully.").await
}

#[derive(Serialize)]
pub struct Dashboard {
    store: StoreProfile,
    items: Vec<ItemView>,
    sales_report: Vec<DailySales>,
}

#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn dashboard(State(state): State<AppState>, session: ShopperSession, CurrentStore(store): CurrentStore) -> Result<Json<PageView<Dashboard>>> {
    let items = state.db.items_by_store(store.id).await?;
    let sales_report = sales::sales_report(state.db.as_ref(), store.id, Utc::now()).await?;
    page(&session, Dashboard { store: store.profile(), items: items.iter().map(ItemView::from).collect(), sales_report }).await
}

#[derive(Serialize)]
pub struct Profile {
    store: StoreProfile,
}

pub async fn profile(session: ShopperSession, CurrentStore(store): CurrentStore) -> Result<Json<PageView<Profile>>> {
    page(&session, Profile { store: store.profile() }).await
}

/// Reads the add/edit item form. Unknown parts are skipped.
async fn read_item_form(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<ItemSubmission> {
    let mut multipart = multipart?;
    let mut form = ItemSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = field.text().await?,
            "price" => form.price = field.text().await?,
            "description" => form.description = field.text().await?,
            "category" => form.category = Some(field.text().await?),
            "clear_image" => form.clear_image = is_checked(&field.text().await?),
            "image" | "photo" => form.image = Some(read_upload(field).await?),
            _ => {}
        }
    }
    Ok(form)
}

async fn read_upload(field: Field<'_>) -> Result<ImageUpload> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let bytes = field.bytes().await?.to_vec();
    Ok(ImageUpload { file_name, content_type, bytes })
}

fn is_checked(value: &str) -> bool { matches!(value.trim(), "on" | "true" | "1" | "yes") }

#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn add_item(State(state): State<AppState>, session: ShopperSession, CurrentStore(store): CurrentStore, multipart: std::result::Result<Multipart, MultipartRejection>) -> Response {
    let result = match read_item_form(multipart).await {
        Ok(form) => catalog::add_item(state.db.as_ref(), &state.events, &store, form).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_with_flash(&session, DASHBOARD, FlashLevel::Success, "Product added successfully!").await,
        Err(e) => redirect_with_error(&session, DASHBOARD, e).await,
    }
}

#[derive(Serialize)]
pub struct EditItem {
    item: ItemView,
}

pub async fn edit_item_page(State(state): State<AppState>, session: ShopperSession, CurrentStore(store): CurrentStore, Path(item_id): Path<String>) -> Response {
    match catalog::owned_item(state.db.as_ref(), &store, &item_id).await {
        Ok(item) => page(&session, EditItem { item: ItemView::from(&item) }).await.into_response(),
        Err(StorefrontError::NotFound(_)) => redirect_with_flash(&session, DASHBOARD, FlashLevel::Danger, "Item not found or unauthorized.").await,
        Err(e) => redirect_with_error(&session, DASHBOARD, e).await,
    }
}

#[instrument(skip_all, fields(store_id = %store.id, item_id = %item_id))]
pub async fn edit_item(
    State(state): State<AppState>,
    session: ShopperSession,
    CurrentStore(store): CurrentStore,
    Path(item_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let result = match read_item_form(multipart).await {
        Ok(form) => catalog::edit_item(state.db.as_ref(), &state.events, &store, &item_id, form).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_with_flash(&session, DASHBOARD, FlashLevel::Success, "Item updated successfully!").await,
        Err(e) => redirect_with_error(&session, DASHBOARD, e).await,
    }
}

#[instrument(skip_all, fields(store_id = %store.id, item_id = %item_id))]
pub async fn delete_item(State(state): State<AppState>, session: ShopperSession, CurrentStore(store): CurrentStore, Path(item_id): Path<String>) -> Response {
    match catalog::delete_item(state.db.as_ref(), &state.events, &store, &item_id).await {
        Ok(()) => redirect_with_flash(&session, DASHBOARD, FlashLevel::Success, "Item deleted successfully!").await,
        Err(e) => redirect_with_error(&session, DASHBOARD, e).await,
    }
}
