//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self { Self(Uuid::now_v7()) }
            pub const fn from_uuid(id: Uuid) -> Self { Self(id) }
            pub const fn as_uuid(&self) -> Uuid { self.0 }
        }

        impl Default for $name { fn default() -> Self { Self::new() } }

        impl FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }
    };
}

entity_id!(
    /// Customer identifier
    CustomerId
);
entity_id!(
    /// Store (seller) identifier
    StoreId
);
entity_id!(
    /// Catalog item identifier
    ItemId
);
entity_id!(
    /// Order identifier
    OrderId
);

/// Catalog category. Only these three are accepted when a store lists an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pizza,
    Beverage,
    Breads,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pizza, Category::Beverage, Category::Breads];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pizza => "Pizza",
            Self::Beverage => "Beverage",
            Self::Breads => "Breads",
        }
    }

    /// Case-insensitive lookup used when browsing.
    pub fn parse_loose(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(value))
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    /// Exact match, as required when listing an item.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CategoryError(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct CategoryError(pub String);

/// Postal address, copied verbatim into orders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub flat_no: String,
    pub street: String,
    pub landmark: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl Address {
    /// Single-line form shown on order confirmation.
    pub fn summary(&self) -> String {
        format!("{}, {}, {}, {} - {}", self.flat_no, self.street, self.landmark, self.city, self.pincode)
    }
}

/// Highest price an item may carry.
pub const MAX_PRICE: i64 = 10_000_000;

/// Item price. Always non-negative and at most [`MAX_PRICE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative); }
        if amount > Decimal::from(MAX_PRICE) { return Err(PriceError::TooLarge); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
}

impl FromStr for Price {
    type Err = PriceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Malformed(s.to_string()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price is not a number: {0}")]
    Malformed(String),
    #[error("price cannot exceed 10000000")]
    TooLarge,
}

/// Uploaded item image, kept base64-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemImage {
    content_type: String,
    data: String,
}

impl ItemImage {
    pub fn from_upload(content_type: &str, bytes: &[u8]) -> Result<Self, ImageError> {
        use base64::Engine as _;
        if !content_type.starts_with("image/") {
            return Err(ImageError::NotAnImage(content_type.to_string()));
        }
        Ok(Self {
            content_type: content_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    pub(crate) fn from_stored(content_type: String, data: String) -> Self { Self { content_type, data } }

    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn data(&self) -> &str { &self.data }
    pub fn data_url(&self) -> String { format!("data:{};base64,{}", self.content_type, self.data) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("uploaded file is not an image ({0})")]
    NotAnImage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_exact_match() {
        assert_eq!("Pizza".parse::<Category>().unwrap(), Category::Pizza);
        assert!("pizza".parse::<Category>().is_err());
        assert!("Burgers".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_loose_match() {
        assert_eq!(Category::parse_loose("beverage"), Some(Category::Beverage));
        assert_eq!(Category::parse_loose(" BREADS "), Some(Category::Breads));
        assert_eq!(Category::parse_loose("all"), None);
    }

    #[test]
    fn test_price() {
        assert_eq!("12.50".parse::<Price>().unwrap().amount(), Decimal::new(1250, 2));
        assert_eq!("-1".parse::<Price>(), Err(PriceError::Negative));
        assert!(matches!("ten".parse::<Price>(), Err(PriceError::Malformed(_))));
        assert_eq!("10000000".parse::<Price>().unwrap().amount(), Decimal::from(MAX_PRICE));
        assert_eq!("10000000.01".parse::<Price>(), Err(PriceError::TooLarge));
        assert_eq!("79228162514264337593543950335".parse::<Price>(), Err(PriceError::TooLarge));
    }

    #[test]
    fn test_image_requires_image_content_type() {
        let img = ItemImage::from_upload("image/png", b"abc").unwrap();
        assert_eq!(img.data(), "YWJj");
        assert_eq!(img.data_url(), "data:image/png;base64,YWJj");
        assert!(ItemImage::from_upload("text/plain", b"abc").is_err());
    }

    #[test]
    fn test_address_summary() {
        let a = Address { flat_no: "12".into(), street: "MG Road".into(), landmark: "Near Park".into(), city: "Pune".into(), state: "MH".into(), pincode: "411001".into() };
        assert_eq!(a.summary(), "12, MG Road, Near Park, Pune - 411001");
    }

    #[test]
    fn test_ids_parse() {
        let id = ItemId::new();
        assert_eq!(id.to_string().parse::<ItemId>().unwrap(), id);
        assert!("not-a-uuid".parse::<ItemId>().is_err());
    }
}
