use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use lestari_core::Role;

use super::controller::{
    create_product, create_review, delete_product, get_product, get_products,
    get_products_by_seller, get_top_rated, update_product,
};
use crate::middleware::ownership::OwnershipRequirement;
use crate::middleware::policy::{AccessPolicy, enforce_policy};
use crate::state::AppState;
use crate::store::ProductOwners;

/// Mounted at `/api/products` and at the singular `/api/product`.
///
/// Every product route requires a signed-in principal. Listing needs the
/// seller role, changing a product needs ownership (admins bypass), and
/// deleting needs both.
pub fn init_products_router(state: &AppState) -> Router<AppState> {
    let ownership = OwnershipRequirement::new(
        "Product",
        Arc::new(ProductOwners(state.products.clone())),
    );

    let browse = Router::new()
        .route("/", get(get_products))
        .route("/top-rated", get(get_top_rated))
        .route("/product-top", get(get_top_rated))
        .route("/seller/{seller_id}", get(get_products_by_seller))
        .route("/{id}", get(get_product))
        .route("/{id}/reviews", post(create_review))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::authenticated().bind(state.clone()),
            enforce_policy,
        ));

    let sell = Router::new()
        .route("/", post(create_product))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::roles(&[Role::Seller]).bind(state.clone()),
            enforce_policy,
        ));

    let modify = Router::new()
        .route("/{id}", patch(update_product))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::authenticated()
                .with_ownership(ownership.clone())
                .bind(state.clone()),
            enforce_policy,
        ));

    let remove = Router::new()
        .route("/{id}", delete(delete_product))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::roles(&[Role::Seller, Role::Admin])
                .with_ownership(ownership)
                .bind(state.clone()),
            enforce_policy,
        ));

    browse.merge(sell).merge(modify).merge(remove)
}
