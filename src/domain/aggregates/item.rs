//! Item Aggregate

use chrono::{DateTime, Utc};
use crate::domain::value_objects::{Category, ItemId, ItemImage, Price, StoreId};
use crate::domain::events::{DomainEvent, ItemEvent};

/// A catalog entry owned by exactly one store.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    id: ItemId,
    store_id: StoreId,
    name: String,
    price: Price,
    description: String,
    category: Category,
    image: Option<ItemImage>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Changes submitted from the edit form.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageChange {
    Keep,
    Replace(ItemImage),
    Clear,
}

impl Item {
    pub fn create(store_id: StoreId, name: impl Into<String>, price: Price, description: impl Into<String>, category: Category, image: Option<ItemImage>) -> (Self, DomainEvent) {
        let now = Utc::now();
        let item = Self {
            id: ItemId::new(), store_id, name: name.into(), price, description: description.into(),
            category, image, created_at: now, updated_at: now,
        };
        let event = DomainEvent::Item(ItemEvent::Added { item_id: item.id, store_id });
        (item, event)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(id: ItemId, store_id: StoreId, name: String, price: Price, description: String, category: Category, image: Option<ItemImage>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self { id, store_id, name, price, description, category, image, created_at, updated_at }
    }

    pub fn id(&self) -> ItemId { self.id }
    pub fn store_id(&self) -> StoreId { self.store_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> Price { self.price }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> Category { self.category }
    pub fn image(&self) -> Option<&ItemImage> { self.image.as_ref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn is_owned_by(&self, store_id: StoreId) -> bool { self.store_id == store_id }

    pub fn update(&mut self, name: impl Into<String>, price: Price, description: impl Into<String>) {
        self.name = name.into();
        self.price = price;
        self.description = description.into();
        self.touch();
    }

    pub fn change_image(&mut self, change: ImageChange) {
        match change {
            ImageChange::Keep => return,
            ImageChange::Replace(image) => self.image = Some(image),
            ImageChange::Clear => self.image = None,
        }
        self.touch();
    }

    pub fn updated_event(&self) -> DomainEvent {
        DomainEvent::Item(ItemEvent::Updated { item_id: self.id, store_id: self.store_id })
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn price(cents: i64) -> Price { Price::new(Decimal::new(cents, 2)).unwrap() }

    #[test]
    fn test_item_create() {
        let store = StoreId::new();
        let (item, event) = Item::create(store, "Farmhouse", price(29900), "Veg loaded", Category::Pizza, None);
        assert_eq!(item.name(), "Farmhouse");
        assert!(item.is_owned_by(store));
        assert!(!item.is_owned_by(StoreId::new()));
        assert_eq!(event, DomainEvent::Item(ItemEvent::Added { item_id: item.id(), store_id: store }));
    }

    #[test]
    fn test_image_changes() {
        let (mut item, _) = Item::create(StoreId::new(), "Lassi", price(6000), "", Category::Beverage, None);
        item.change_image(ImageChange::Replace(ItemImage::from_upload("image/jpeg", b"jpg").unwrap()));
        assert!(item.image().is_some());
        item.change_image(ImageChange::Keep);
        assert!(item.image().is_some());
        item.change_image(ImageChange::Clear);
        assert!(item.image().is_none());
    }
}
