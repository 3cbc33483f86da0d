use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductData {
    #[schema(value_type = Object)]
    pub product: Value,
}

/// `{status, data: {product}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub status: String,
    pub data: ProductData,
}

impl ProductResponse {
    pub fn success(product: Value) -> Self {
        Self {
            status: "success".to_string(),
            data: ProductData { product },
        }
    }
}

/// Body of `201 Created` after a product is listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedProductResponse {
    #[schema(value_type = Object)]
    pub product: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewCreatedResponse {
    pub status: String,
    pub message: String,
}
