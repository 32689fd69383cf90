//! Order placement.
//!
//! The order is written before anything else happens; callers clear the
//! session cart only after this returns `Ok`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::db::Database;
use crate::domain::aggregates::{Cart, Customer, Order};
use crate::domain::value_objects::OrderId;
use crate::error::Result;
use crate::services::events::EventPublisher;

/// What the shopper sees after a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub name: String,
    pub address: String,
    pub items: String,
    pub total_amount: Decimal,
}

#[instrument(skip(db, events, customer, cart), fields(customer_id = %customer.id, lines = cart.item_count()))]
pub async fn place_order(
    db: &dyn Database,
    events: &EventPublisher,
    customer: &Customer,
    cart: &Cart,
    grand_total: Decimal,
    payment_method: Option<String>,
    now: DateTime<Utc>,
) -> Result<OrderConfirmation> {
    let (order, event) = Order::place(customer, cart, grand_total, payment_method, now)?;
    db.insert_order(&order).await?;
    info!(order_id = %order.id(), total = %order.total_amount(), "order placed");
    events.publish(event).await;

    Ok(OrderConfirmation {
        order_id: order.id(),
        name: order.name().to_string(),
        address: order.address().summary(),
        items: order.item_summary(),
        total_amount: order.total_amount(),
    })
}
