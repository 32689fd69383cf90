//! HTTP surface.

mod auth;
mod cart;
mod catalog;
mod customer;
mod pages;
mod store;
mod views;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{MemoryStore, SessionStore};

use crate::session::create_session_layer;
use crate::state::AppState;

pub use auth::{CurrentCustomer, CurrentStore};
pub use pages::PageView;

/// Router with sessions held in process memory.
pub fn router(state: AppState) -> Router { router_with_session_store(state, MemoryStore::default()) }

pub fn router_with_session_store<S: SessionStore + Clone>(state: AppState, sessions: S) -> Router {
    let session_layer = create_session_layer(sessions, &state.config);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(customer::home))
        .route("/health", get(health))
        // customers
        .route("/customer/register", get(customer::register_page).post(customer::register))
        .route("/customer/login", get(customer::login_page).post(customer::login))
        .route("/customer/logout", get(customer::logout))
        .route("/customer/dashboard", get(customer::dashboard))
        .route("/customer/profile", get(customer::profile))
        .route("/customer/profile-data", get(customer::profile_data))
        .route("/customer/my-orders", get(customer::my_orders))
        // browsing
        .route("/category/:name", get(catalog::category_page))
        .route("/api/category/:name", get(catalog::api_category))
        // cart and checkout
        .route("/cart", get(cart::view_cart))
        .route("/add-to-cart/:item_id", post(cart::add_to_cart))
        .route("/update_cart", post(cart::update_cart))
        .route("/clear-cart", get(cart::clear_cart))
        .route("/api/cart/add", post(cart::api_add_to_cart))
        .route("/api/update-cart-quantity", post(cart::api_update_quantity))
        .route("/api/remove_from_cart", post(cart::api_remove_from_cart))
        .route("/api/set_grand_total", post(cart::api_set_grand_total))
        .route("/payment", get(cart::payment))
        .route("/place-order", post(cart::place_order))
        // stores
        .route("/store/register", get(store::register_page).post(store::register))
        .route("/store/login", get(store::login_page).post(store::login))
        .route("/store/logout", get(store::logout))
        .route("/store/dashboard", get(store::dashboard))
        .route("/store/profile", get(store::profile))
        .route("/store/add-item", post(store::add_item))
        .route("/store/edit-item/:item_id", get(store::edit_item_page).post(store::edit_item))
        .route("/store/delete-item/:item_id", get(store::delete_item))
        .route("/store/:store_id", get(catalog::store_items))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(session_layer)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "storefront", "events": state.events.is_connected() }))
}
