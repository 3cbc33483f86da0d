use std::env;
use std::str::FromStr;

/// Reads and parses `key`, falling back to `default` when the variable is
/// unset or does not parse.
pub(crate) fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

/// Accepts `1`/`true`/`yes`/`on` (any case) as true.
pub(crate) fn flag(key: &str) -> bool {
    env::var(key)
        .map(|raw| {
            matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
