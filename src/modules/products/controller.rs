use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use lestari_core::AppError;
use lestari_core::errors::ErrorResponse;
use lestari_core::query::{QueryParams, build_query_spec};
use lestari_models::{
    CreateProductDto, CreateReviewDto, PRODUCT_SCHEMA, ProductListResponse, UpdateProductDto,
};

use super::model::{CreatedProductResponse, ProductResponse, ReviewCreatedResponse};
use super::service::{ProductService, parse_product_id, present};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List a new product (sellers only)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductDto,
    responses(
        (status = 201, description = "Product created", body = CreatedProductResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only sellers may list products", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateProductDto>,
) -> Result<(StatusCode, Json<CreatedProductResponse>), AppError> {
    let product = ProductService::create(state.products.as_ref(), &auth_user.user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedProductResponse {
            product: present(&product)?,
        }),
    ))
}

/// List products
///
/// Accepts `field=value` and `field[gte|gt|lte|lt]=value` filters plus
/// `sort`, `fields`, `page` and `limit`.
#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated fields, `-` prefix for descending", example = "-price,name"),
        ("fields" = Option<String>, Query, description = "Comma-separated fields to return", example = "name,price"),
        ("page" = Option<i64>, Query, description = "Page number (1-indexed)"),
        ("limit" = Option<i64>, Query, description = "Items per page (max 100)")
    ),
    responses(
        (status = 200, description = "Products", body = ProductListResponse),
        (status = 400, description = "Rejected query parameter (strict mode)", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let spec = build_query_spec(&params, &PRODUCT_SCHEMA, state.query_options())?;
    let products = ProductService::list(state.products.as_ref(), &spec).await?;
    Ok(Json(ProductListResponse::success(products)))
}

/// Top five products by rating
#[utoipa::path(
    get,
    path = "/api/products/top-rated",
    responses(
        (status = 200, description = "Top rated products", body = ProductListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_top_rated(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, AppError> {
    let products = ProductService::top_rated(state.products.as_ref(), state.query_options()).await?;
    Ok(Json(ProductListResponse::success(products)))
}

/// Products of one seller
#[utoipa::path(
    get,
    path = "/api/products/seller/{seller_id}",
    params(("seller_id" = Uuid, Path, description = "Seller ID")),
    responses(
        (status = 200, description = "The seller's products", body = ProductListResponse),
        (status = 400, description = "Invalid seller ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_products_by_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let seller_id = Uuid::parse_str(&seller_id)
        .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid seller ID")))?;

    let products = ProductService::list_by_seller(
        state.products.as_ref(),
        seller_id,
        &params,
        state.query_options(),
    )
    .await?;
    Ok(Json(ProductListResponse::success(products)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = ProductService::get(state.products.as_ref(), parse_product_id(&id)?).await?;
    Ok(Json(ProductResponse::success(present(&product)?)))
}

/// Update a product (owner or admin)
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductDto,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the product owner", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state, dto))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateProductDto>,
) -> Result<Json<ProductResponse>, AppError> {
    let product =
        ProductService::update(state.products.as_ref(), parse_product_id(&id)?, dto).await?;
    Ok(Json(ProductResponse::success(present(&product)?)))
}

/// Delete a product (owning seller or admin)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the product owner", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ProductService::delete(state.products.as_ref(), parse_product_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Review a product
#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review added", body = ReviewCreatedResponse),
        (status = 400, description = "Product already reviewed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<ReviewCreatedResponse>), AppError> {
    ProductService::add_review(
        state.products.as_ref(),
        parse_product_id(&id)?,
        &auth_user.user,
        dto,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            status: "success".to_string(),
            message: "Review added".to_string(),
        }),
    ))
}
