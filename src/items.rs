//! # Items Module
//!
//! Record types produced by the extractors.
//!
//! Every record carries an identity parsed from its page URL. All other fields are
//! optional and skipped on serialization when the page did not provide them, so an
//! exported line only holds the keys that were actually populated.

use crate::coerce::Coerced;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An item that can travel through the crawler and its pipelines.
pub trait ScrapedItem: Serialize + fmt::Debug + Clone + Send + Sync + 'static {
    /// Lower-case type name used to pick the output stream.
    fn item_type(&self) -> &'static str;
}

/// The entity types harvested from the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Product,
    Review,
    User,
    Brand,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [
        ItemType::Product,
        ItemType::Review,
        ItemType::User,
        ItemType::Brand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Review => "review",
            ItemType::User => "user",
            ItemType::Brand => "brand",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One color or pattern variant listed on a product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker: Option<String>,
    /// Brand name as printed on the page, not a link to a [`Brand`] record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Coerced>,
    /// `[rank, category]`, either part present only when shown.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranking: Vec<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub have_count: Option<Coerced>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Only known when the review was read from its own page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<u64>,
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    /// 1 to 7.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purchase_location: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_words: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zodiac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<Coerced>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_user_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_brand_count: Option<Coerced>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub brand_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<Coerced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<Coerced>,
}

/// Any record emitted by the cosme.net spider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CosmeItem {
    Product(Product),
    Review(Review),
    User(User),
    Brand(Brand),
}

impl CosmeItem {
    pub fn kind(&self) -> ItemType {
        match self {
            CosmeItem::Product(_) => ItemType::Product,
            CosmeItem::Review(_) => ItemType::Review,
            CosmeItem::User(_) => ItemType::User,
            CosmeItem::Brand(_) => ItemType::Brand,
        }
    }
}

impl ScrapedItem for CosmeItem {
    fn item_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl From<Product> for CosmeItem {
    fn from(product: Product) -> Self {
        CosmeItem::Product(product)
    }
}

impl From<Review> for CosmeItem {
    fn from(review: Review) -> Self {
        CosmeItem::Review(review)
    }
}

impl From<User> for CosmeItem {
    fn from(user: User) -> Self {
        CosmeItem::User(user)
    }
}

impl From<Brand> for CosmeItem {
    fn from(brand: Brand) -> Self {
        CosmeItem::Brand(brand)
    }
}
