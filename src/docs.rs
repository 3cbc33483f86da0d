use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use lestari_core::Role;
use lestari_core::errors::ErrorResponse;
use lestari_models::products::ProductListData;
use lestari_models::{
    AuthResponse, BusinessType, Category, ChangePasswordRequest, CreateProductDto,
    CreateReviewDto, LoginRequest, MessageResponse, Product, ProductListResponse,
    RegisterRequest, Review, SellerInfo, UpdateProductDto, UpgradeToSellerRequest, User,
    UserListResponse,
};

use crate::modules::products::model::{
    CreatedProductResponse, ProductData, ProductResponse, ReviewCreatedResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::upgrade_to_seller,
        crate::modules::auth::controller::change_password,
        crate::modules::products::controller::create_product,
        crate::modules::products::controller::get_products,
        crate::modules::products::controller::get_top_rated,
        crate::modules::products::controller::get_products_by_seller,
        crate::modules::products::controller::get_product,
        crate::modules::products::controller::update_product,
        crate::modules::products::controller::delete_product,
        crate::modules::products::controller::create_review,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
    ),
    components(
        schemas(
            Role,
            User,
            SellerInfo,
            BusinessType,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpgradeToSellerRequest,
            ChangePasswordRequest,
            MessageResponse,
            UserListResponse,
            Category,
            Product,
            Review,
            CreateProductDto,
            UpdateProductDto,
            CreateReviewDto,
            ProductListData,
            ProductListResponse,
            ProductData,
            ProductResponse,
            CreatedProductResponse,
            ReviewCreatedResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and account endpoints"),
        (name = "Products", description = "Product catalogue and reviews"),
        (name = "Users", description = "User administration endpoints")
    ),
    info(
        title = "Lestari API",
        version = "0.1.0",
        description = "Marketplace API for local products, built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
