//! Cart operations that need the catalog.

use tracing::debug;

use crate::db::Database;
use crate::domain::aggregates::{Cart, Item};
use crate::domain::value_objects::ItemId;
use crate::error::{Result, StorefrontError};

/// Adds one unit of the item to `cart` and returns the item that was added.
pub async fn add_to_cart(db: &dyn Database, cart: &mut Cart, item_id: &str) -> Result<Item> {
    let not_found = || StorefrontError::NotFound("Product not found!".into());
    let id: ItemId = item_id.trim().parse().map_err(|_| not_found())?;
    let item = db.item_by_id(id).await?.ok_or_else(not_found)?;
    let line = cart.add(&item);
    debug!(item_id = %id, quantity = line.quantity, "added to cart");
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::services::testing::{seed_item, seed_store};

    #[tokio::test]
    async fn test_repeated_adds_merge_into_one_line() {
        let db = MemoryDatabase::new();
        let store = seed_store(&db, "9300000001").await;
        let item = seed_item(&db, &store, "Garlic Bread", 120).await;
        let mut cart = Cart::new();
        for _ in 0..3 {
            add_to_cart(&db, &mut cart, &item.id().to_string()).await.unwrap();
        }
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let db = MemoryDatabase::new();
        let mut cart = Cart::new();
        let missing = add_to_cart(&db, &mut cart, &ItemId::new().to_string()).await;
        assert!(matches!(missing, Err(StorefrontError::NotFound(ref m)) if m == "Product not found!"));
        assert!(matches!(add_to_cart(&db, &mut cart, "garbage").await, Err(StorefrontError::NotFound(_))));
        assert!(cart.is_empty());
    }
}
