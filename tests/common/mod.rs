#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use lestari::lestari_auth::TokenService;
use lestari::lestari_config::{CorsConfig, JwtConfig, QueryConfig, ServerConfig};
use lestari::lestari_core::Role;
use lestari::lestari_models::{SellerInfo, User};
use lestari::router::init_router;
use lestari::state::AppState;
use lestari::store::{MemoryStore, NewUser, UserStore};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "rahasia123";

/// State over a fresh in-memory store, with the cheapest bcrypt cost.
pub fn test_state() -> AppState {
    test_state_with(QueryConfig::default())
}

pub fn test_state_with(query_config: QueryConfig) -> AppState {
    let store = Arc::new(MemoryStore::new(4));

    AppState {
        users: store.clone(),
        products: store,
        tokens: TokenService::new(&JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
        }),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        query_config,
        server_config: ServerConfig {
            bcrypt_cost: 4,
            ..ServerConfig::default()
        },
    }
}

pub fn app(state: &AppState) -> Router {
    init_router(state.clone())
}

pub fn generate_unique_email() -> String {
    format!("user-{}@example.com", uuid::Uuid::new_v4())
}

pub async fn create_test_user(state: &AppState, role: Role) -> User {
    let name = format!("Pengguna {}", role);
    let users: &dyn UserStore = state.users.as_ref();

    users
        .insert(NewUser {
            seller_info: (role == Role::Seller).then(|| SellerInfo::default_for(&name)),
            name,
            email: generate_unique_email(),
            phone: "081234567890".to_string(),
            password: TEST_PASSWORD.to_string(),
            role,
        })
        .await
        .unwrap()
}

pub fn bearer(state: &AppState, user: &User) -> String {
    let token = state
        .tokens
        .issue_access_token(user.id.into_inner(), user.role)
        .unwrap();
    format!("Bearer {}", token)
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
