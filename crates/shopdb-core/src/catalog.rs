use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::specs::SpecTable;

/// Brand recorded when neither the product URL nor its name yields one.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// A catalog category products are imported into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// A product scraped from a retail detail page, awaiting review or import.
///
/// This is the shape handed back by a preview run and accepted by an import
/// run. It must survive a JSON round-trip unchanged, so every field the
/// importer reads lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedCandidate {
    pub name: String,
    /// Never empty; [`UNKNOWN_BRAND`] when extraction found nothing.
    pub brand: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: SpecTable,
    pub category_id: i32,
    /// Absolute image URLs in carousel order, deduplicated.
    #[serde(default)]
    pub remote_image_urls: Vec<String>,
    /// Non-fatal extraction notes. Never blocks import.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Detail page the candidate was scraped from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i32,
}

impl ScrapedCandidate {
    /// Brand used for the `(name, brand)` duplicate check and the stored row.
    ///
    /// Hand-edited import files may blank the brand; those fall back to
    /// [`UNKNOWN_BRAND`] the same way extraction does.
    #[must_use]
    pub fn effective_brand(&self) -> &str {
        let brand = self.brand.trim();
        if brand.is_empty() {
            UNKNOWN_BRAND
        } else {
            brand
        }
    }

    /// Returns `true` if any field extraction degraded for this candidate.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Owner kinds an image row can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerType {
    Product,
    Category,
    Review,
    User,
}

impl OwnerType {
    /// Integer discriminant stored in the `images.owner_type` column.
    #[must_use]
    pub fn as_db_value(self) -> i32 {
        match self {
            OwnerType::Product => 0,
            OwnerType::Category => 1,
            OwnerType::Review => 2,
            OwnerType::User => 3,
        }
    }
}

/// An image reference to be stored alongside a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    /// Public URL returned by the image store.
    pub url: String,
    pub alt_text: Option<String>,
    /// 0-based, gap-free across the product's stored images.
    pub position: i32,
}

/// Fields written for a freshly imported product, plus its image rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub category_id: i32,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub description: String,
    pub specs: SpecTable,
    pub stock_quantity: i32,
    pub images: Vec<NewImage>,
}

/// A failure tied to one item (page, product, or image) of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// URL or product name the failure refers to.
    pub item: String,
    pub message: String,
}

impl ItemError {
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub per_item_errors: Vec<ItemError>,
    /// Set when the run stopped early on request.
    #[serde(default)]
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ScrapedCandidate {
        ScrapedCandidate {
            name: "Samsung Galaxy A55".to_string(),
            brand: "Samsung".to_string(),
            price: Decimal::new(123_456, 2),
            description: "Смартфон".to_string(),
            specs: [("Цвет", "синий"), ("Память", "256 ГБ")]
                .into_iter()
                .collect(),
            category_id: 3,
            remote_image_urls: vec!["https://img.example.com/1.jpeg".to_string()],
            errors: vec![],
            source_url: Some("https://catalog.onliner.by/mobile/samsung/a55".to_string()),
            stock_quantity: 0,
        }
    }

    #[test]
    fn candidate_survives_json_round_trip() {
        let original = candidate();
        let json = serde_json::to_string(&original).unwrap();
        let back: ScrapedCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn price_serializes_as_decimal_string() {
        let json = serde_json::to_value(candidate()).unwrap();
        assert_eq!(json["price"], "1234.56");
    }

    #[test]
    fn minimal_hand_written_candidate_deserializes() {
        let json = r#"{"name":"Kettle","brand":"Bosch","price":"59.90","category_id":1}"#;
        let c: ScrapedCandidate = serde_json::from_str(json).unwrap();
        assert!(c.specs.is_empty());
        assert!(c.remote_image_urls.is_empty());
        assert_eq!(c.stock_quantity, 0);
        assert!(c.source_url.is_none());
    }

    #[test]
    fn blank_brand_falls_back_to_unknown() {
        let mut c = candidate();
        c.brand = "  ".to_string();
        assert_eq!(c.effective_brand(), UNKNOWN_BRAND);
    }

    #[test]
    fn owner_type_db_values_are_stable() {
        assert_eq!(OwnerType::Product.as_db_value(), 0);
        assert_eq!(OwnerType::User.as_db_value(), 3);
    }
}
