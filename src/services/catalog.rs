//! Store-scoped catalog management and catalog browsing.
//!
//! A store may only touch items it owns. Items owned by another store are
//! reported exactly like missing ones.

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::db::Database;
use crate::domain::aggregates::{ImageChange, Item, Store};
use crate::domain::events::{DomainEvent, ItemEvent};
use crate::domain::value_objects::{Category, ItemId, ItemImage, Price, StoreId};
use crate::error::{Result, StorefrontError};
use crate::services::events::EventPublisher;

/// A file part from the item form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Browsers send an empty file part when nothing was chosen.
    pub fn is_present(&self) -> bool { !self.file_name.is_empty() && !self.bytes.is_empty() }
}

/// Fields of the add/edit item form.
#[derive(Debug, Clone, Default)]
pub struct ItemSubmission {
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

impl ItemSubmission {
    fn upload(&self) -> Result<Option<ItemImage>> {
        match &self.image {
            Some(upload) if upload.is_present() => Ok(Some(ItemImage::from_upload(&upload.content_type, &upload.bytes)?)),
            _ => Ok(None),
        }
    }

    fn name(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StorefrontError::InvalidArgument("Item name is required.".into()));
        }
        Ok(name.to_string())
    }
}

/// An item together with the name of the store selling it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub item: Item,
    pub store_name: String,
}

const ITEM_NOT_FOUND: &str = "Item not found or you are not authorized to edit it.";

#[instrument(skip(db, events, store, submission), fields(store_id = %store.id))]
pub async fn add_item(db: &dyn Database, events: &EventPublisher, store: &Store, submission: ItemSubmission) -> Result<Item> {
    let image = submission.upload()?;
    let category: Category = submission.category.as_deref().unwrap_or_default().parse()?;
    let name = submission.name()?;
    let price: Price = submission.price.parse()?;

    let (item, event) = Item::create(store.id, name, price, submission.description.trim(), category, image);
    db.insert_item(&item).await?;
    info!(item_id = %item.id(), "item added");
    events.publish(event).await;
    Ok(item)
}

/// Loads an item only if `store` owns it.
pub async fn owned_item(db: &dyn Database, store: &Store, item_id: &str) -> Result<Item> {
    let not_found = || StorefrontError::NotFound(ITEM_NOT_FOUND.into());
    let id: ItemId = item_id.parse().map_err(|_| not_found())?;
    match db.item_by_id(id).await? {
        Some(item) if item.is_owned_by(store.id) => Ok(item),
        _ => Err(not_found()),
    }
}

#[instrument(skip(db, events, store, submission), fields(store_id = %store.id))]
pub async fn edit_item(db: &dyn Database, events: &EventPublisher, store: &Store, item_id: &str, submission: ItemSubmission) -> Result<Item> {
    let mut item = owned_item(db, store, item_id).await?;
    let name = submission.name()?;
    let price: Price = submission.price.parse()?;
    let image_change = match submission.upload()? {
        Some(image) => ImageChange::Replace(image),
        None if submission.clear_image => ImageChange::Clear,
        None => ImageChange::Keep,
    };

    item.update(name, price, submission.description.trim());
    item.change_image(image_change);
    if !db.update_item(&item).await? {
        return Err(StorefrontError::NotFound(ITEM_NOT_FOUND.into()));
    }
    info!(item_id = %item.id(), "item updated");
    events.publish(item.updated_event()).await;
    Ok(item)
}

#[instrument(skip(db, events, store), fields(store_id = %store.id))]
pub async fn delete_item(db: &dyn Database, events: &EventPublisher, store: &Store, item_id: &str) -> Result<()> {
    let not_found = || StorefrontError::NotFound("Item not found or you are not authorized to delete it.".into());
    let id: ItemId = item_id.parse().map_err(|_| not_found())?;
    if !db.delete_item(id, store.id).await? {
        return Err(not_found());
    }
    info!(item_id = %id, "item deleted");
    events.publish(DomainEvent::Item(ItemEvent::Deleted { item_id: id, store_id: store.id })).await;
    Ok(())
}

/// Items in a category, matched case-insensitively; `all` lists everything.
/// Unknown categories yield an empty list.
pub async fn browse_category(db: &dyn Database, name: &str) -> Result<Vec<CatalogEntry>> {
    let filter = if name.trim().eq_ignore_ascii_case("all") {
        None
    } else {
        match Category::parse_loose(name) {
            Some(category) => Some(category),
            None => return Ok(Vec::new()),
        }
    };
    let items = db.items_by_category(filter).await?;
    with_store_names(db, items).await
}

async fn with_store_names(db: &dyn Database, items: Vec<Item>) -> Result<Vec<CatalogEntry>> {
    let mut store_ids: Vec<StoreId> = items.iter().map(Item::store_id).collect();
    store_ids.sort();
    store_ids.dedup();
    let names: HashMap<StoreId, String> = db.stores_by_ids(&store_ids).await?.into_iter().map(|s| (s.id, s.store_name)).collect();
    Ok(items
        .into_iter()
        .map(|item| {
            let store_name = names.get(&item.store_id()).cloned().unwrap_or_else(|| "Unknown Store".to_string());
            CatalogEntry { item, store_name }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::services::testing::seed_store;

    fn submission(category: &str) -> ItemSubmission {
        ItemSubmission { name: "Paneer Tikka".into(), price: "349.00".into(), description: "Spicy".into(), category: Some(category.into()), ..Default::default() }
    }

    #[tokio::test]
    async fn test_add_item_validates_category() {
        let db = MemoryDatabase::new();
        let store = seed_store(&db, "9200000001").await;
        let events = EventPublisher::disabled();

        let rejected = add_item(&db, &events, &store, submission("Burgers")).await;
        assert!(matches!(rejected, Err(StorefrontError::InvalidArgument(_))));
        let rejected = add_item(&db, &events, &store, ItemSubmission { category: None, ..submission("Pizza") }).await;
        assert!(matches!(rejected, Err(StorefrontError::InvalidArgument(_))));
        assert_eq!(db.item_count().await, 0);

        let item = add_item(&db, &events, &store, submission("Pizza")).await.unwrap();
        assert_eq!(item.category(), Category::Pizza);
        assert_eq!(db.item_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_item_rejects_non_image_upload() {
        let db = MemoryDatabase::new();
        let store = seed_store(&db, "9200000001").await;
        let upload = ImageUpload { file_name: "menu.pdf".into(), content_type: "application/pdf".into(), bytes: b"%PDF".to_vec() };
        let rejected = add_item(&db, &EventPublisher::disabled(), &store, ItemSubmission { image: Some(upload), ..submission("Pizza") }).await;
        assert!(matches!(rejected, Err(StorefrontError::InvalidArgument(ref m)) if m.contains("not an image")));
        assert_eq!(db.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_file_part_is_ignored() {
        let db = MemoryDatabase::new();
        let store = seed_store(&db, "9200000001").await;
        let upload = ImageUpload { file_name: String::new(), content_type: "application/octet-stream".into(), bytes: Vec::new() };
        let item = add_item(&db, &EventPublisher::disabled(), &store, ItemSubmission { image: Some(upload), ..submission("Breads") }).await.unwrap();
        assert!(item.image().is_none());
    }

    #[tokio::test]
    async fn test_other_store_cannot_edit_or_delete() {
        let db = MemoryDatabase::new();
        let events = EventPublisher::disabled();
        let owner = seed_store(&db, "9200000001").await;
        let intruder = seed_store(&db, "9200000002").await;
        let item = add_item(&db, &events, &owner, submission("Pizza")).await.unwrap();
        let id = item.id().to_string();

        let edit = ItemSubmission { name: "Hacked".into(), ..submission("Pizza") };
        assert!(matches!(edit_item(&db, &events, &intruder, &id, edit).await, Err(StorefrontError::NotFound(_))));
        assert!(matches!(delete_item(&db, &events, &intruder, &id).await, Err(StorefrontError::NotFound(_))));

        let stored = db.item_by_id(item.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), "Paneer Tikka");
    }

    #[tokio::test]
    async fn test_edit_and_delete_by_owner() {
        let db = MemoryDatabase::new();
        let events = EventPublisher::disabled();
        let store = seed_store(&db, "9200000001").await;
        let upload = ImageUpload { file_name: "p.png".into(), content_type: "image/png".into(), bytes: vec![1, 2, 3] };
        let item = add_item(&db, &events, &store, ItemSubmission { image: Some(upload), ..submission("Pizza") }).await.unwrap();
        let id = item.id().to_string();

        let edited = edit_item(&db, &events, &store, &id, ItemSubmission { name: "Tandoori Paneer".into(), price: "399".into(), clear_image: true, ..Default::default() }).await.unwrap();
        assert_eq!(edited.name(), "Tandoori Paneer");
        assert!(edited.image().is_none());
        assert_eq!(edited.category(), Category::Pizza);

        delete_item(&db, &events, &store, &id).await.unwrap();
        assert!(matches!(delete_item(&db, &events, &store, &id).await, Err(StorefrontError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_browse_category() {
        let db = MemoryDatabase::new();
        let events = EventPublisher::disabled();
        let store = seed_store(&db, "9200000001").await;
        add_item(&db, &events, &store, submission("Pizza")).await.unwrap();
        add_item(&db, &events, &store, ItemSubmission { name: "Lassi".into(), ..submission("Beverage") }).await.unwrap();

        let pizzas = browse_category(&db, "PIZZA").await.unwrap();
        assert_eq!(pizzas.len(), 1);
        assert_eq!(pizzas[0].store_name, store.store_name);
        assert_eq!(browse_category(&db, "all").await.unwrap().len(), 2);
        assert!(browse_category(&db, "desserts").await.unwrap().is_empty());
    }
}
