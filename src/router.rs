use crate::docs::openapi_json;
use crate::logging::logging_middleware;
use crate::middleware::policy::{AccessPolicy, enforce_policy};
use crate::modules::auth::init_auth_router;
use crate::modules::products::init_products_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Router, middleware};
use lestari_core::Role;
use tower_http::cors::CorsLayer;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router(&state))
                .nest("/products", init_products_router(&state))
                .nest("/product", init_products_router(&state))
                .nest(
                    "/users",
                    init_users_router().route_layer(middleware::from_fn_with_state(
                        AccessPolicy::roles(&[Role::Admin]).bind(state.clone()),
                        enforce_policy,
                    )),
                ),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
}
