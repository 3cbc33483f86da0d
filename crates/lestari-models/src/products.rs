//! Product listings and reviews.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use lestari_core::query::{CollectionSchema, FieldDef, FieldKind};

use crate::ids::{ProductId, ReviewId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Makanan,
    Minuman,
    Kerajinan,
    Fashion,
    Kecantikan,
    RumahTangga,
    Elektronik,
    Lainnya,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Makanan => "makanan",
            Category::Minuman => "minuman",
            Category::Kerajinan => "kerajinan",
            Category::Fashion => "fashion",
            Category::Kecantikan => "kecantikan",
            Category::RumahTangga => "rumah-tangga",
            Category::Elektronik => "elektronik",
            Category::Lainnya => "lainnya",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "makanan" => Ok(Category::Makanan),
            "minuman" => Ok(Category::Minuman),
            "kerajinan" => Ok(Category::Kerajinan),
            "fashion" => Ok(Category::Fashion),
            "kecantikan" => Ok(Category::Kecantikan),
            "rumah-tangga" => Ok(Category::RumahTangga),
            "elektronik" => Ok(Category::Elektronik),
            "lainnya" => Ok(Category::Lainnya),
            other => Err(format!("Invalid category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Owner of the listing. Set at creation and never changed.
    pub seller_id: UserId,
    pub seller_name: String,
    pub seller_location: String,
    pub category: Category,
    pub sub_category: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub discount_percentage: Option<i32>,
    pub stock: i32,
    pub weight: f64,
    pub unit: String,
    pub images: Vec<String>,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_available: bool,
    pub rating: f64,
    pub num_reviews: i32,
    pub reviews: Vec<Review>,
    /// Bumped on every update; internal, hidden from listings by default.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn has_review_from(&self, user_id: UserId) -> bool {
        self.reviews.iter().any(|review| review.user_id == user_id)
    }

    /// Recomputes `rating` and `num_reviews` from the attached reviews.
    pub fn refresh_rating(&mut self) {
        self.num_reviews = i32::try_from(self.reviews.len()).unwrap_or(i32::MAX);
        self.rating = if self.reviews.is_empty() {
            0.0
        } else {
            let total: i64 = self.reviews.iter().map(|r| i64::from(r.rating)).sum();
            total as f64 / self.reviews.len() as f64
        };
    }
}

/// URL slug from a product name: lowercased, spaces replaced by `-`.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

/// `round((price - discount) / price * 100)`, or `None` when either side is
/// missing or the price is zero.
pub fn discount_percentage(price: f64, discount_price: Option<f64>) -> Option<i32> {
    let discount = discount_price?;
    if price <= 0.0 {
        return None;
    }
    Some(((price - discount) / price * 100.0).round() as i32)
}

fn validate_discount(dto: &CreateProductDto) -> Result<(), ValidationError> {
    match dto.discount_price {
        Some(discount) if discount >= dto.price => Err(ValidationError::new("discount_price")
            .with_message("Discount price must be lower than the price".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_discount", skip_on_field_errors = false))]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub category: Category,
    pub sub_category: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0.0))]
    pub discount_price: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(range(min = 0.0))]
    pub weight: f64,
    pub unit: Option<String>,
    #[validate(length(min = 1, message = "A product needs at least one image"))]
    pub images: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub is_available: Option<bool>,
}

/// Partial update. The owner and the slug's source are fixed at creation.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub sub_category: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    /// `null` removes the discount.
    #[serde(default, deserialize_with = "lestari_core::serde::deserialize_nullable")]
    #[schema(value_type = Option<f64>)]
    #[validate(range(min = 0.0))]
    pub discount_price: Option<Option<f64>>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
    pub unit: Option<String>,
    #[validate(length(min = 1, message = "A product needs at least one image"))]
    pub images: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListData {
    #[schema(value_type = Vec<Object>)]
    pub products: Vec<serde_json::Value>,
}

/// `{status, results, data: {products}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub status: String,
    pub results: usize,
    pub data: ProductListData,
}

impl ProductListResponse {
    pub fn success(products: Vec<serde_json::Value>) -> Self {
        Self {
            status: "success".to_string(),
            results: products.len(),
            data: ProductListData { products },
        }
    }
}

pub static PRODUCT_SCHEMA: CollectionSchema = CollectionSchema {
    name: "products",
    fields: &[
        FieldDef::new("id", FieldKind::Uuid),
        FieldDef::new("name", FieldKind::Text),
        FieldDef::new("slug", FieldKind::Text),
        FieldDef::unfilterable("description", FieldKind::Text),
        FieldDef::new("seller_id", FieldKind::Uuid),
        FieldDef::new("seller_name", FieldKind::Text),
        FieldDef::new("seller_location", FieldKind::Text),
        FieldDef::new("category", FieldKind::Text),
        FieldDef::new("sub_category", FieldKind::Text),
        FieldDef::new("price", FieldKind::Number),
        FieldDef::new("discount_price", FieldKind::Number),
        FieldDef::new("discount_percentage", FieldKind::Number),
        FieldDef::new("stock", FieldKind::Number),
        FieldDef::new("weight", FieldKind::Number),
        FieldDef::new("unit", FieldKind::Text),
        FieldDef::unfilterable("images", FieldKind::TextList),
        FieldDef::new("materials", FieldKind::TextList),
        FieldDef::new("colors", FieldKind::TextList),
        FieldDef::new("tags", FieldKind::TextList),
        FieldDef::new("is_featured", FieldKind::Boolean),
        FieldDef::new("is_available", FieldKind::Boolean),
        FieldDef::new("rating", FieldKind::Number),
        FieldDef::new("num_reviews", FieldKind::Number),
        FieldDef::unfilterable("version", FieldKind::Number),
        FieldDef::new("created_at", FieldKind::Timestamp),
        FieldDef::new("updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "created_at",
    hidden_fields: &["version"],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Kopi Gayo Arabika"), "kopi-gayo-arabika");
        assert_eq!(slugify("  Batik Tulis "), "batik-tulis");
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(200.0, Some(150.0)), Some(25));
        assert_eq!(discount_percentage(3.0, Some(2.0)), Some(33));
        assert_eq!(discount_percentage(200.0, None), None);
        assert_eq!(discount_percentage(0.0, Some(0.0)), None);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(
            serde_json::to_value(Category::RumahTangga).unwrap(),
            "rumah-tangga"
        );
        assert_eq!("rumah-tangga".parse::<Category>(), Ok(Category::RumahTangga));
        assert!("jasa".parse::<Category>().is_err());
    }

    fn create_dto() -> CreateProductDto {
        CreateProductDto {
            name: "Kopi Gayo".to_string(),
            description: "Arabika".to_string(),
            category: Category::Minuman,
            sub_category: None,
            price: 100.0,
            discount_price: Some(80.0),
            stock: 10,
            weight: 250.0,
            unit: None,
            images: vec!["kopi.jpg".to_string()],
            materials: vec![],
            colors: vec![],
            tags: vec![],
            is_featured: false,
            is_available: None,
        }
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(create_dto().validate().is_ok());

        let no_images = CreateProductDto {
            images: vec![],
            ..create_dto()
        };
        assert!(no_images.validate().is_err());

        let discount_too_high = CreateProductDto {
            discount_price: Some(100.0),
            ..create_dto()
        };
        assert!(discount_too_high.validate().is_err());

        let negative_price = CreateProductDto {
            price: -1.0,
            discount_price: None,
            ..create_dto()
        };
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn test_review_rating_range() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let dto = CreateReviewDto {
                rating,
                comment: None,
            };
            assert_eq!(dto.validate().is_ok(), ok, "rating={rating}");
        }
    }

    #[test]
    fn test_schema_hides_version() {
        assert_eq!(PRODUCT_SCHEMA.hidden_fields, &["version"]);
        assert!(PRODUCT_SCHEMA.field("price").is_some());
        assert!(PRODUCT_SCHEMA.field("reviews").is_none());
    }
}
