//! Token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with the shared secret from
//! [`JwtConfig`]. Expiry is checked with zero leeway: a token is rejected
//! as soon as the current time passes `exp`.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use lestari_config::JwtConfig;
use lestari_core::{AppError, Role};

use crate::claims::Claims;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, wrongly signed, or carrying claims this service never
    /// issues.
    #[error("Invalid token")]
    Invalid,
    #[error("Token has expired")]
    Expired,
    #[error("Failed to create token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => AppError::unauthorized(err.to_string()),
            TokenError::Encoding(_) => AppError::internal(err),
        }
    }
}

/// What a successfully verified token asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub principal_id: Uuid,
    pub role: Role,
    /// `iat`, in whole seconds since the Unix epoch.
    pub issued_at: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_token_expiry: config.access_token_expiry,
        }
    }

    /// Issues a token with the configured access token lifetime.
    pub fn issue_access_token(&self, principal_id: Uuid, role: Role) -> Result<String, TokenError> {
        self.issue(principal_id, role, self.access_token_expiry)
    }

    /// Issues a token valid for `ttl` seconds from now.
    pub fn issue(&self, principal_id: Uuid, role: Role, ttl: i64) -> Result<String, TokenError> {
        self.issue_at(principal_id, role, Utc::now(), ttl)
    }

    pub fn issue_at(
        &self,
        principal_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
        ttl: i64,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: principal_id.to_string(),
            role: role.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                kind => {
                    tracing::debug!(?kind, "Rejected access token");
                    TokenError::Invalid
                }
            })?;

        let principal_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;
        let role = claims.role.parse::<Role>().map_err(|_| TokenError::Invalid)?;

        Ok(VerifiedToken {
            principal_id,
            role,
            issued_at: claims.iat,
        })
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }
}
