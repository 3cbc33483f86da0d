use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use lestari_core::AppError;
use lestari_core::errors::ErrorResponse;
use lestari_models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    UpgradeToSellerRequest, User,
};

use super::model::{auth_cookie, cleared_auth_cookie};
use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new client or seller account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Email already registered or role not allowed", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = AuthService::register(state.users.as_ref(), &state.tokens, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login and receive a bearer token
///
/// The token is also set as an HttpOnly `jwt` cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
        (status = 422, description = "Email or password missing", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let response = AuthService::login(state.users.as_ref(), &state.tokens, dto).await?;
    let cookie = auth_cookie(&response.token, state.tokens.access_token_expiry())
        .map_err(AppError::internal)?;

    Ok(([(header::SET_COOKIE, cookie)], Json(response)).into_response())
}

/// Clear the auth cookie
#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.id()))]
pub async fn logout(auth_user: AuthUser) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cleared_auth_cookie())],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_me(auth_user: AuthUser) -> Json<User> {
    Json(auth_user.user)
}

/// Upgrade a client account to a seller account
#[utoipa::path(
    patch,
    path = "/api/auth/upgrade-to-seller",
    request_body = UpgradeToSellerRequest,
    responses(
        (status = 200, description = "Account upgraded", body = AuthResponse),
        (status = 400, description = "Already a seller", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn upgrade_to_seller(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpgradeToSellerRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response =
        AuthService::upgrade_to_seller(state.users.as_ref(), &state.tokens, &auth_user, dto)
            .await?;
    Ok(Json(response))
}

/// Change the current user's password
///
/// Tokens issued before the change are rejected afterwards; the response
/// carries a fresh token.
#[utoipa::path(
    patch,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = AuthResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<Response, AppError> {
    let response =
        AuthService::change_password(state.users.as_ref(), &state.tokens, &auth_user, dto).await?;
    let cookie = auth_cookie(&response.token, state.tokens.access_token_expiry())
        .map_err(AppError::internal)?;

    Ok(([(header::SET_COOKIE, cookie)], Json(response)).into_response())
}
