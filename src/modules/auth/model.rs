use axum::http::{HeaderValue, header::InvalidHeaderValue};

/// Name of the cookie carrying the access token for browser clients.
pub const AUTH_COOKIE: &str = "jwt";

/// `Set-Cookie` value storing `token` for `max_age` seconds.
pub fn auth_cookie(token: &str, max_age: i64) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        AUTH_COOKIE, token, max_age
    ))
}

/// Overwrites the auth cookie with a placeholder that expires in a second.
pub fn cleared_auth_cookie() -> HeaderValue {
    HeaderValue::from_static("jwt=loggedout; HttpOnly; Path=/; Max-Age=1; SameSite=Lax")
}
