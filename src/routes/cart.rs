//! Cart, payment and checkout routes.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::Utc;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use super::auth::{is_xhr, CurrentCustomer};
use super::customer::DASHBOARD;
use super::pages::{page, redirect_with_error, redirect_with_flash, PageView};
use super::views::CartView;
use crate::domain::aggregates::cart::{grand_total, Removal, MAX_GRAND_TOTAL};
use crate::domain::value_objects::ItemId;
use crate::error::{Result, StorefrontError};
use crate::services::{cart as cart_service, checkout};
use crate::session::{FlashLevel, ShopperSession};
use crate::state::AppState;

const CART: &str = "/cart";

/// JSON body whose parse failures become `StorefrontError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(StorefrontError))]
pub struct ApiJson<T>(pub T);

fn money(amount: Decimal) -> f64 { amount.to_f64().unwrap_or_default() }

/// Stores the grand total for a non-empty cart so checkout can use it.
#[instrument(skip_all)]
pub async fn view_cart(session: ShopperSession, CurrentCustomer(_): CurrentCustomer) -> Result<Json<PageView<CartView>>> {
    let cart = session.cart().await?;
    let view = CartView::from(&cart);
    if view.total > Decimal::ZERO {
        session.set_grand_total(grand_total(view.total)).await?;
    }
    page(&session, view).await
}

/// Form and XHR variant. XHR callers get JSON; browsers are sent back to the
/// item's store page. No login is needed to fill a cart.
#[instrument(skip_all, fields(item_id = %item_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
    Path(item_id): Path<String>,
) -> Response {
    let xhr = is_xhr(&headers);
    let outcome = async {
        let mut cart = session.cart().await?;
        let item = cart_service::add_to_cart(state.db.as_ref(), &mut cart, &item_id).await?;
        session.save_cart(&cart).await?;
        Ok::<_, StorefrontError>((item, cart.item_count()))
    }
    .await;

    match outcome {
        Ok((item, count)) if xhr => Json(json!({ "success": true, "product_name": item.name(), "cart_count": count })).into_response(),
        Ok((item, _)) => {
            let target = match state.db.store_by_id(item.store_id()).await {
                Ok(Some(store)) => format!("/store/{}", store.id),
                _ => DASHBOARD.to_string(),
            };
            redirect_with_flash(&session, &target, FlashLevel::Success, format!("\"{}\" added to cart!", item.name())).await
        }
        Err(e) if xhr => e.into_response(),
        Err(e) => redirect_with_error(&session, DASHBOARD, e).await,
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    item_id: Option<String>,
}

pub async fn api_add_to_cart(session: ShopperSession, State(state): State<AppState>, CurrentCustomer(_): CurrentCustomer, ApiJson(body): ApiJson<AddRequest>) -> Result<Json<Value>> {
    let item_id = body.item_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| StorefrontError::InvalidArgument("No item_id provided".into()))?;
    let mut cart = session.cart().await?;
    let item = cart_service::add_to_cart(state.db.as_ref(), &mut cart, &item_id).await?;
    session.save_cart(&cart).await?;
    Ok(Json(json!({ "success": true, "product_name": item.name(), "cart_count": cart.item_count() })))
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    quantity: Value,
}

pub async fn api_update_quantity(session: ShopperSession, ApiJson(body): ApiJson<QuantityRequest>) -> Result<Json<Value>> {
    let mut cart = session.existing_cart().await?.ok_or_else(|| StorefrontError::InvalidArgument("Cart is empty.".into()))?;
    let invalid = || StorefrontError::InvalidArgument("Invalid data.".into());
    let item_id: ItemId = body.item_id.as_deref().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    // Only JSON integers are accepted; "2" and 2.5 are not.
    let quantity = body.quantity.as_i64().ok_or_else(invalid)?;
    let change = cart.set_quantity(item_id, quantity)?;
    session.save_cart(&cart).await?;
    Ok(Json(json!({ "success": true, "subtotal": money(change.subtotal), "total": money(change.total) })))
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    #[serde(default)]
    item_id: Option<String>,
}

pub async fn api_remove_from_cart(session: ShopperSession, ApiJson(body): ApiJson<RemoveRequest>) -> Result<Json<Value>> {
    let item_id = body.item_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| StorefrontError::InvalidArgument("No item_id provided".into()))?;
    let mut cart = session.existing_cart().await?.ok_or_else(|| StorefrontError::InvalidArgument("Cart is empty or invalid".into()))?;
    // An unparsable id cannot be in the cart, so it is a no-op like any other miss.
    let removal = match item_id.parse::<ItemId>() {
        Ok(id) => cart.remove(id),
        Err(_) => Removal { total: cart.total(), remaining: cart.item_count() },
    };
    session.save_cart(&cart).await?;
    Ok(Json(json!({ "success": true, "total": money(removal.total), "cart_length": removal.remaining })))
}

/// Form posts carry `quantities[<item id>]=<n>` pairs.
pub async fn update_cart(session: ShopperSession, Form(fields): Form<Vec<(String, String)>>) -> Response {
    let mut cart = match session.existing_cart().await {
        Ok(Some(cart)) => cart,
        Ok(None) => return redirect_with_flash(&session, CART, FlashLevel::Danger, "Your cart is empty.").await,
        Err(e) => return redirect_with_error(&session, CART, e).await,
    };
    cart.bulk_set_quantities(&parse_quantities(&fields));
    if let Err(e) = session.save_cart(&cart).await {
        return redirect_with_error(&session, CART, e).await;
    }
    redirect_with_flash(&session, CART, FlashLevel::Success, "Cart updated successfully!").await
}

fn parse_quantities(fields: &[(String, String)]) -> HashMap<ItemId, String> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix("quantities[")?.strip_suffix(']')?;
            Some((id.parse().ok()?, value.clone()))
        })
        .collect()
}

pub async fn clear_cart(session: ShopperSession) -> Response {
    if let Err(e) = session.clear_cart().await {
        return redirect_with_error(&session, CART, e).await;
    }
    redirect_with_flash(&session, CART, FlashLevel::Success, "Cart cleared successfully.").await
}

#[derive(Debug, Deserialize)]
pub struct GrandTotalRequest {
    #[serde(default)]
    grand_total: Option<Decimal>,
}

/// Records the total the browser displayed; checkout charges this amount.
pub async fn api_set_grand_total(session: ShopperSession, ApiJson(body): ApiJson<GrandTotalRequest>) -> Result<Json<Value>> {
    let amount = body.grand_total.unwrap_or(Decimal::ZERO);
    if amount < Decimal::ZERO || amount > Decimal::from(MAX_GRAND_TOTAL) {
        return Err(StorefrontError::InvalidArgument("Invalid data.".into()));
    }
    session.set_grand_total(amount).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Serialize)]
pub struct Payment {
    #[serde(with = "rust_decimal::serde::float")]
    total_amount: Decimal,
}

pub async fn payment(session: ShopperSession, CurrentCustomer(_): CurrentCustomer) -> Result<Json<PageView<Payment>>> {
    let total_amount = session.grand_total().await?;
    page(&session, Payment { total_amount }).await
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    #[serde(default)]
    method: Option<String>,
}

/// The cart is cleared only once the order has been stored.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: ShopperSession,
    CurrentCustomer(customer): CurrentCustomer,
    form: Option<Form<PlaceOrderForm>>,
) -> Result<Json<Value>> {
    let cart = session.cart().await?;
    let total = session.grand_total().await?;
    let method = form.and_then(|Form(f)| f.method);
    let confirmation = checkout::place_order(state.db.as_ref(), &state.events, &customer, &cart, total, method, Utc::now()).await?;
    session.clear_cart().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order placed successfully!",
        "order_id": confirmation.order_id,
        "name": confirmation.name,
        "address": confirmation.address,
        "items": confirmation.items,
        "total_amount": money(confirmation.total_amount),
    })))
}
