use serde::{Deserialize, Serialize};

/// JWT claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (subject claim)
    pub sub: String,
    /// Role at the time of issuance
    pub role: String,
    /// Issued-at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration (Unix timestamp, seconds)
    pub exp: i64,
}
