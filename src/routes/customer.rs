//! Customer account pages.

use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::auth::{CurrentCustomer, CUSTOMER_LOGIN};
use super::pages::{page, redirect_with_error, redirect_with_flash, Blank, PageView};
use super::views::{OrderView, StoreCard};
use crate::domain::aggregates::CustomerProfile;
use crate::domain::value_objects::Category;
use crate::error::Result;
use crate::services::accounts::{self, CustomerLogin, CustomerRegistration};
use crate::session::{FlashLevel, ShopperSession};
use crate::state::AppState;

pub const DASHBOARD: &str = "/customer/dashboard";
const REGISTER: &str = "/customer/register";

pub async fn register_page(session: ShopperSession) -> Result<Json<PageView<Blank>>> {
    page(&session, Blank {}).await
}

#[instrument(skip_all)]
pub async fn register(State(state): State<AppState>, session: ShopperSession, form: std::result::Result<Form<CustomerRegistration>, FormRejection>) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => return redirect_with_error(&session, REGISTER, e.into()).await,
    };
    match accounts::register_customer(state.db.as_ref(), &state.events, form).await {
        Ok(_) => redirect_with_flash(&session, CUSTOMER_LOGIN, FlashLevel::Success, "Registration successful! Please log in.").await,
        Err(e) => redirect_with_error(&session, REGISTER, e).await,
    }
}

pub async fn login_page(session: ShopperSession) -> Result<Json<PageView<Blank>>> {
    page(&session, Blank {}).await
}

#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: ShopperSession, form: std::result::Result<Form<CustomerLogin>, FormRejection>) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => return redirect_with_error(&session, CUSTOMER_LOGIN, e.into()).await,
    };
    let customer = match accounts::login_customer(state.db.as_ref(), &form).await {
        Ok(customer) => customer,
        Err(e) => return redirect_with_error(&session, CUSTOMER_LOGIN, e).await,
    };
    if let Err(e) = session.login_customer(customer.id).await {
        return redirect_with_error(&session, CUSTOMER_LOGIN, e).await;
    }
    redirect_with_flash(&session, DASHBOARD, FlashLevel::Success, "Logged in successfully!").await
}

#[derive(Serialize)]
pub struct Dashboard {
    customer: CustomerProfile,
    stores: Vec<StoreCard>,
}

#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn dashboard(State(state): State<AppState>, session: ShopperSession, CurrentCustomer(customer): CurrentCustomer) -> Result<Json<PageView<Dashboard>>> {
    let stores = state.db.list_stores().await?;
    page(&session, Dashboard { customer: customer.profile(), stores: stores.iter().map(StoreCard::from).collect() }).await
}

#[derive(Serialize)]
pub struct Profile {
    customer: CustomerProfile,
}

pub async fn profile(session: ShopperSession, CurrentCustomer(customer): CurrentCustomer) -> Result<Json<PageView<Profile>>> {
    page(&session, Profile { customer: customer.profile() }).await
}

pub async fn profile_data(CurrentCustomer(customer): CurrentCustomer) -> impl IntoResponse {
    Json(json!({ "success": true, "customer": customer.profile() }))
}

#[derive(Serialize)]
pub struct MyOrders {
    orders: Vec<OrderView>,
}

#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn my_orders(State(state): State<AppState>, session: ShopperSession, CurrentCustomer(customer): CurrentCustomer) -> Result<Json<PageView<MyOrders>>> {
    let orders = state.db.orders_for_customer(customer.id).await?;
    page(&session, MyOrders { orders: orders.iter().map(OrderView::from).collect() }).await
}

/// Also empties the cart.
pub async fn logout(session: ShopperSession) -> Response {
    if let Err(e) = session.logout_customer().await {
        return redirect_with_error(&session, CUSTOMER_LOGIN, e).await;
    }
    redirect_with_flash(&session, CUSTOMER_LOGIN, FlashLevel::Info, "Logged out successfully.").await
}

#[derive(Serialize)]
pub struct Home {
    customer_logged_in: bool,
    store_logged_in: bool,
    categories: Vec<&'static str>,
}

pub async fn home(session: ShopperSession) -> Result<Json<PageView<Home>>> {
    let view = Home {
        customer_logged_in: session.customer_id().await?.is_some(),
        store_logged_in: session.store_id().await?.is_some(),
        categories: Category::ALL.iter().map(Category::as_str).collect(),
    };
    page(&session, view).await
}
