//! Marketplace roles.
//!
//! Every principal holds exactly one role. `client` is the default at
//! registration, `seller` is reachable by registration or upgrade, and
//! `admin` is only created out of band (CLI).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Client,
    Seller,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::Seller, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }

    /// Roles a user may pick for themselves when registering.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Role::Client | Role::Seller)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert_eq!(
            "superuser".parse::<Role>(),
            Err(RoleParseError("superuser".to_string()))
        );
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_default_role_is_client() {
        assert_eq!(Role::default(), Role::Client);
    }

    #[test]
    fn test_self_assignable_roles() {
        assert!(Role::Client.is_self_assignable());
        assert!(Role::Seller.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), r#""seller""#);
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
    }
}
