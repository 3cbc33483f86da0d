//! # Lestari Models
//!
//! Domain models and DTOs for the Lestari marketplace API.
//!
//! - [`ids`]: strongly-typed entity ids
//! - [`users`]: principals, seller profiles and auth DTOs
//! - [`products`]: products, reviews and product DTOs
//!
//! Each collection also declares the [`CollectionSchema`] the query feature
//! builder resolves request parameters against ([`USER_SCHEMA`],
//! [`PRODUCT_SCHEMA`]).
//!
//! [`CollectionSchema`]: lestari_core::query::CollectionSchema

pub mod ids;
pub mod products;
pub mod users;

// Re-export commonly used types at crate root for convenience
pub use ids::{ProductId, ReviewId, UserId};

pub use products::{
    Category, CreateProductDto, CreateReviewDto, PRODUCT_SCHEMA, Product, ProductListResponse,
    Review, UpdateProductDto, discount_percentage, slugify,
};

pub use users::{
    AuthResponse, BusinessType, ChangePasswordRequest, DEFAULT_PROFILE_PICTURE, LoginRequest, MessageResponse,
    RegisterRequest, SellerInfo, USER_SCHEMA, UpgradeToSellerRequest, User, UserCredentials,
    UserListResponse,
};
