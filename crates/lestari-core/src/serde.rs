use serde::{Deserialize, Deserializer};

/// Tells an absent field apart from an explicit `null` in a partial update.
/// Use with `#[serde(default, deserialize_with = "...")]`: absent stays
/// `None`, `null` becomes `Some(None)`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
