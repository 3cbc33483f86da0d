use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use thiserror::Error;
use tracing::{debug, warn};

use lestari_auth::{TokenService, VerifiedToken};
use lestari_core::{AppError, Role};
use lestari_models::{User, UserId};

use crate::state::AppState;
use crate::store::UserStore;

/// Why a request was refused before reaching its handler.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("User recently changed password. Please log in again")]
    StaleCredential,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// The credential store itself failed.
    #[error("{0}")]
    Store(AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(message) => AppError::forbidden(message),
            AuthError::NotFound(message) => AppError::not_found(anyhow::anyhow!(message)),
            AuthError::Store(inner) => inner,
            unauthenticated => AppError::unauthorized(unauthenticated.to_string()),
        }
    }
}

/// The authenticated principal of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: VerifiedToken,
    /// Current record; its role wins over the role claimed by the token.
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AuthError::Unauthenticated(
                "You are not logged in. Please log in to get access".to_string(),
            )
        })?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AuthError::Unauthenticated("Invalid authorization header format".to_string())
        })
}

/// Resolves the principal behind a request's bearer token.
///
/// The token must verify, its subject must name an active user, and the
/// user's credential must not have changed after the token was issued.
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    users: &dyn UserStore,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers)?;

    let principal = tokens.verify(token).map_err(|err| {
        debug!(error = %err, "Rejected bearer token");
        AuthError::Unauthenticated(err.to_string())
    })?;

    let user = users
        .find_by_id(UserId::from(principal.principal_id))
        .await
        .map_err(AuthError::Store)?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            AuthError::Unauthenticated(
                "The user belonging to this token no longer exists".to_string(),
            )
        })?;

    if user.changed_credential_after(principal.issued_at) {
        warn!(user_id = %user.id, "Token issued before password change");
        return Err(AuthError::StaleCredential);
    }

    Ok(AuthUser { principal, user })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by the policy middleware
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let auth_user = authenticate(&parts.headers, &state.tokens, state.users.as_ref()).await?;
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use lestari_config::JwtConfig;

    use crate::store::{MemoryStore, NewUser, SecretChange};

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "auth-middleware-test-secret".to_string(),
            access_token_expiry: 3600,
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn seeded(store: &dyn UserStore) -> User {
        store
            .insert(NewUser {
                name: "Sari".to_string(),
                email: "sari@example.com".to_string(),
                phone: "08123456789".to_string(),
                password: "rahasia123".to_string(),
                role: Role::Seller,
                seller_info: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let memory = MemoryStore::new(4);
        let store: &dyn UserStore = &memory;
        let user = seeded(store).await;
        let tokens = tokens();
        let token = tokens
            .issue_access_token(user.id.into_inner(), user.role)
            .unwrap();

        let auth_user = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, store)
            .await
            .unwrap();

        assert_eq!(auth_user.id(), user.id);
        assert_eq!(auth_user.role(), Role::Seller);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header() {
        let memory = MemoryStore::new(4);
        let tokens = tokens();

        for headers in [HeaderMap::new(), headers_with("Token abc"), headers_with("Bearer ")] {
            let err = authenticate(&headers, &tokens, &memory).await.unwrap_err();
            assert!(matches!(err, AuthError::Unauthenticated(_)));
        }
    }

    #[tokio::test]
    async fn test_unknown_principal_is_unauthenticated() {
        let memory = MemoryStore::new(4);
        let tokens = tokens();
        let token = tokens
            .issue_access_token(uuid::Uuid::new_v4(), Role::Client)
            .unwrap();

        let err = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &memory)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_inactive_principal_is_unauthenticated() {
        let memory = MemoryStore::new(4);
        let store: &dyn UserStore = &memory;
        let mut user = seeded(store).await;
        user.is_active = false;
        store.save(&user, SecretChange::Keep).await.unwrap();

        let tokens = tokens();
        let token = tokens
            .issue_access_token(user.id.into_inner(), user.role)
            .unwrap();

        let err = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_token_older_than_credential_change_is_stale() {
        let memory = MemoryStore::new(4);
        let store: &dyn UserStore = &memory;
        let user = seeded(store).await;
        let tokens = tokens();
        let old_token = tokens
            .issue_at(
                user.id.into_inner(),
                user.role,
                Utc::now() - Duration::seconds(10),
                3600,
            )
            .unwrap();

        store
            .save(&user, SecretChange::Replace("rahasiaBaru1".to_string()))
            .await
            .unwrap();

        let err = authenticate(&headers_with(&format!("Bearer {old_token}")), &tokens, store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StaleCredential));
        assert_eq!(AppError::from(err).status().as_u16(), 401);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AuthError::Unauthenticated("x".to_string()), 401),
            (AuthError::StaleCredential, 401),
            (AuthError::Forbidden("x".to_string()), 403),
            (AuthError::NotFound("x".to_string()), 404),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status().as_u16(), expected);
        }
    }
}
