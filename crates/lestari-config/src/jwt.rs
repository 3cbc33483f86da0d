use std::env;

/// Token lifetime when `JWT_ACCESS_EXPIRY` is unset: one day.
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 86_400;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET is not set, using the development secret");
            "lestari-dev-secret-change-in-production".to_string()
        });

        Self {
            secret,
            access_token_expiry: crate::env::parse_or(
                "JWT_ACCESS_EXPIRY",
                DEFAULT_ACCESS_TOKEN_EXPIRY,
            )
            .max(1),
        }
    }
}
