use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;
use uuid::Uuid;

use lestari_core::AppError;
use lestari_core::errors::ErrorResponse;
use lestari_core::query::{QueryParams, build_query_spec};
use lestari_models::{USER_SCHEMA, User, UserId, UserListResponse};

use super::service::UserService;
use crate::state::AppState;

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated fields, `-` prefix for descending"),
        ("fields" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("page" = Option<i64>, Query, description = "Page number (1-indexed)"),
        ("limit" = Option<i64>, Query, description = "Items per page (max 100)")
    ),
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let spec = build_query_spec(&params, &USER_SCHEMA, state.query_options())?;
    let users = UserService::list(state.users.as_ref(), &spec).await?;

    Ok(Json(UserListResponse {
        status: "success".to_string(),
        results: users.len(),
        data: users,
    }))
}

/// Get a user by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = Uuid::parse_str(&id)
        .map(UserId::from)
        .map_err(|_| AppError::not_found(anyhow::anyhow!("User not found")))?;

    let user = UserService::get(state.users.as_ref(), id).await?;
    Ok(Json(user))
}
