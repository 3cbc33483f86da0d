//! Principals, seller profiles and the auth DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use lestari_core::{Role, verify_password};
use lestari_core::query::{CollectionSchema, FieldDef, FieldKind};

use crate::ids::UserId;

pub const DEFAULT_PROFILE_PICTURE: &str = "default.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BusinessType {
    #[default]
    Individu,
    Cv,
    Pt,
    Koperasi,
    Lainnya,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SellerInfo {
    pub business_name: String,
    pub business_type: BusinessType,
    pub business_since: DateTime<Utc>,
    pub categories: Vec<String>,
    /// City shown as the location of this seller's products.
    pub city: Option<String>,
}

impl SellerInfo {
    /// Profile given to a seller who registers without business details.
    pub fn default_for(name: &str) -> Self {
        Self {
            business_name: format!("{}'s Business", name),
            business_type: BusinessType::Individu,
            business_since: Utc::now(),
            categories: vec!["lainnya".to_string()],
            city: None,
        }
    }
}

/// A registered principal. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub profile_picture: String,
    pub seller_info: Option<SellerInfo>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    /// Tokens issued before this instant are refused.
    #[serde(skip_serializing)]
    pub credential_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the credential changed after a token issued at `issued_at`
    /// (Unix seconds). Compared at whole-second precision.
    pub fn changed_credential_after(&self, issued_at: i64) -> bool {
        self.credential_changed_at
            .is_some_and(|changed| changed.timestamp() > issued_at)
    }

    pub fn seller_location(&self) -> String {
        self.seller_info
            .as_ref()
            .and_then(|info| info.city.clone())
            .unwrap_or_else(|| "Tidak diketahui".to_string())
    }
}

/// A user together with its stored password hash, as returned by email
/// lookups during login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl UserCredentials {
    /// Checks a candidate password against the stored hash. A hash that
    /// cannot be parsed matches nothing.
    pub fn verify_secret(&self, candidate: &str) -> bool {
        verify_password(candidate, &self.password_hash).unwrap_or(false)
    }
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let len = phone.chars().count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'));

    if (8..=15).contains(&len) && allowed {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("Invalid phone number".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// `client` (default) or `seller`.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpgradeToSellerRequest {
    #[validate(length(min = 1, max = 150))]
    pub business_name: String,
    #[serde(default)]
    pub business_type: BusinessType,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub status: String,
    pub results: usize,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
}

pub static USER_SCHEMA: CollectionSchema = CollectionSchema {
    name: "users",
    fields: &[
        FieldDef::new("id", FieldKind::Uuid),
        FieldDef::new("name", FieldKind::Text),
        FieldDef::new("email", FieldKind::Text),
        FieldDef::unfilterable("phone", FieldKind::Text),
        FieldDef::new("role", FieldKind::Text),
        FieldDef::unfilterable("profile_picture", FieldKind::Text),
        FieldDef::new("is_active", FieldKind::Boolean),
        FieldDef::new("last_login", FieldKind::Timestamp),
        FieldDef::new("created_at", FieldKind::Timestamp),
        FieldDef::new("updated_at", FieldKind::Timestamp),
    ],
    default_sort_field: "created_at",
    hidden_fields: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            name: "Sari".to_string(),
            email: "sari@example.com".to_string(),
            phone: "+62 812-3456".to_string(),
            role: Role::Client,
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            seller_info: None,
            is_active: true,
            last_login: None,
            credential_changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unchanged_credential_never_stale() {
        assert!(!user().changed_credential_after(0));
    }

    #[test]
    fn test_credential_change_compared_in_seconds() {
        let changed = DateTime::from_timestamp(1_700_000_000, 900_000_000).unwrap();
        let user = User {
            credential_changed_at: Some(changed),
            ..user()
        };

        assert!(user.changed_credential_after(1_699_999_999));
        assert!(!user.changed_credential_after(1_700_000_000));
        assert!(!user.changed_credential_after(1_700_000_001));
    }

    #[test]
    fn test_credential_change_is_not_serialized() {
        let user = User {
            credential_changed_at: Some(Utc::now() - Duration::days(1)),
            ..user()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("credential_changed_at").is_none());
        assert_eq!(json["role"], "client");
    }

    #[test]
    fn test_default_seller_info() {
        let info = SellerInfo::default_for("Sari");
        assert_eq!(info.business_name, "Sari's Business");
        assert_eq!(info.business_type, BusinessType::Individu);
        assert_eq!(info.categories, vec!["lainnya"]);
    }

    #[test]
    fn test_seller_location_falls_back() {
        assert_eq!(user().seller_location(), "Tidak diketahui");

        let mut info = SellerInfo::default_for("Sari");
        info.city = Some("Yogyakarta".to_string());
        let seller = User {
            seller_info: Some(info),
            ..user()
        };
        assert_eq!(seller.seller_location(), "Yogyakarta");
    }

    #[test]
    fn test_verify_secret() {
        let credentials = UserCredentials {
            user: user(),
            password_hash: lestari_core::hash_password_with_cost("rahasia123", 4).unwrap(),
        };
        assert!(credentials.verify_secret("rahasia123"));
        assert!(!credentials.verify_secret("rahasia124"));

        let corrupt = UserCredentials {
            password_hash: "plain".to_string(),
            ..credentials
        };
        assert!(!corrupt.verify_secret("plain"));
    }

    #[test]
    fn test_phone_validation() {
        for phone in ["08123456789", "+62 812-345-678"] {
            assert!(validate_phone(phone).is_ok(), "{phone}");
        }
        for phone in ["123", "0812abc4567", "+62 812 3456 7890 12"] {
            assert!(validate_phone(phone).is_err(), "{phone}");
        }
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Sari".to_string(),
            email: "not-an-email".to_string(),
            phone: "08123456789".to_string(),
            password: "short".to_string(),
            role: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("phone"));
    }

    #[test]
    fn test_login_request_missing_fields_fail_validation() {
        let request: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_err());
    }
}
