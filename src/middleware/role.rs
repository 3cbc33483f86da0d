//! Role checks.

use lestari_core::Role;

use crate::middleware::auth::{AuthError, AuthUser};

/// Roles allowed through. An empty set admits any authenticated principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    pub allowed: Vec<Role>,
}

impl RoleRequirement {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn one_of(roles: &[Role]) -> Self {
        Self {
            allowed: roles.to_vec(),
        }
    }

    pub fn check(&self, auth_user: &AuthUser) -> Result<(), AuthError> {
        if self.allowed.is_empty() || self.allowed.contains(&auth_user.role()) {
            return Ok(());
        }

        Err(AuthError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use lestari_auth::VerifiedToken;
    use lestari_models::{DEFAULT_PROFILE_PICTURE, User, UserId};

    pub(crate) fn auth_user_with(role: Role) -> AuthUser {
        let id = UserId::new();
        let now = Utc::now();

        AuthUser {
            principal: VerifiedToken {
                principal_id: id.into_inner(),
                role,
                issued_at: now.timestamp(),
            },
            user: User {
                id,
                name: "Penguji".to_string(),
                email: "penguji@example.com".to_string(),
                phone: "08123456789".to_string(),
                role,
                profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
                seller_info: None,
                is_active: true,
                last_login: None,
                credential_changed_at: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn test_empty_set_admits_every_role() {
        let requirement = RoleRequirement::any();
        for role in Role::ALL {
            assert!(requirement.check(&auth_user_with(role)).is_ok());
        }
    }

    #[test]
    fn test_role_passes_iff_member() {
        let requirement = RoleRequirement::one_of(&[Role::Seller, Role::Admin]);

        assert!(requirement.check(&auth_user_with(Role::Seller)).is_ok());
        assert!(requirement.check(&auth_user_with(Role::Admin)).is_ok());
        assert!(matches!(
            requirement.check(&auth_user_with(Role::Client)),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_is_not_implicitly_allowed() {
        let requirement = RoleRequirement::one_of(&[Role::Seller]);
        assert!(requirement.check(&auth_user_with(Role::Admin)).is_err());
    }
}
