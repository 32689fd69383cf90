//! Seven-day sales report for a store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::Database;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::StoreId;
use crate::error::Result;

pub const REPORT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
}

/// Sums order totals per UTC day over `[now - 7 days, now]`, newest day
/// first. Days without orders are omitted.
///
/// `orders` are those that include the store. An order spanning several
/// stores counts its whole `total_amount`, delivery fee and tax included,
/// toward each of them.
pub fn daily_totals(orders: &[Order], now: DateTime<Utc>) -> Vec<DailySales> {
    let since = now - Duration::days(REPORT_WINDOW_DAYS);
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.placed_at() >= since && o.placed_at() <= now) {
        let day = by_day.entry(order.placed_at().date_naive()).or_default();
        *day = day.saturating_add(order.total_amount());
    }
    by_day
        .into_iter()
        .rev()
        .map(|(day, total)| DailySales { date: day.format("%Y-%m-%d").to_string(), total_sales: total })
        .collect()
}

pub async fn sales_report(db: &dyn Database, store_id: StoreId, now: DateTime<Utc>) -> Result<Vec<DailySales>> {
    let since = now - Duration::days(REPORT_WINDOW_DAYS);
    let orders = db.orders_for_store_since(store_id, since).await?;
    Ok(daily_totals(&orders, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::aggregates::{Cart, Customer, Item};
    use crate::domain::value_objects::{Address, Category, CustomerId, Price};

    fn order_at(store: StoreId, total: i64, at: DateTime<Utc>) -> Order {
        let customer = Customer {
            id: CustomerId::new(), name: "Kiran".into(), phone: "9".into(), email: "k@example.com".into(), pin_hash: String::new(),
            address: Address { flat_no: "1".into(), street: "MG Rd".into(), landmark: String::new(), city: "Pune".into(), state: "MH".into(), pincode: "411001".into() },
            created_at: at,
        };
        let (item, _) = Item::create(store, "Focaccia", Price::new(Decimal::from(total)).unwrap(), "", Category::Breads, None);
        let mut cart = Cart::new();
        cart.add(&item);
        Order::place(&customer, &cart, Decimal::from(total), None, at).unwrap().0
    }

    #[test]
    fn test_no_orders_gives_empty_report() {
        assert!(daily_totals(&[], Utc::now()).is_empty());
    }

    #[test]
    fn test_groups_by_day_descending_and_sparse() {
        let store = StoreId::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let orders = vec![
            order_at(store, 100, Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()),
            order_at(store, 50, Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap()),
            order_at(store, 70, Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap()),
            // outside the window
            order_at(store, 999, Utc.with_ymd_and_hms(2024, 3, 3, 11, 0, 0).unwrap()),
        ];
        let report = daily_totals(&orders, now);
        assert_eq!(
            report,
            vec![
                DailySales { date: "2024-03-10".into(), total_sales: Decimal::from(150) },
                DailySales { date: "2024-03-07".into(), total_sales: Decimal::from(70) },
            ]
        );
    }

    #[test]
    fn test_window_start_is_inclusive() {
        let store = StoreId::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let edge = order_at(store, 20, now - Duration::days(7));
        let report = daily_totals(&[edge], now);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].date, "2024-03-03");
    }
}
