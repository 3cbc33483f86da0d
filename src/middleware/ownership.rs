//! Ownership checks for routes addressing a single resource by `{id}`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use lestari_core::{AppError, Role};

use crate::middleware::auth::{AuthError, AuthUser};

/// Who owns a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner {
    pub id: Uuid,
    pub owner_id: Uuid,
}

#[async_trait]
pub trait ResourceLookup: Send + Sync {
    async fn find_owner(&self, id: Uuid) -> Result<Option<ResourceOwner>, AppError>;
}

#[derive(Clone)]
pub struct OwnershipRequirement {
    /// Used in error messages, e.g. `"Product"`.
    pub resource: &'static str,
    pub lookup: Arc<dyn ResourceLookup>,
}

impl fmt::Debug for OwnershipRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipRequirement")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl OwnershipRequirement {
    pub fn new(resource: &'static str, lookup: Arc<dyn ResourceLookup>) -> Self {
        Self { resource, lookup }
    }

    fn not_found(&self) -> AuthError {
        AuthError::NotFound(format!("{} not found", self.resource))
    }

    /// Passes when the principal owns the resource named by `raw_id`, or is
    /// an admin. The resource must exist either way.
    pub async fn check(&self, auth_user: &AuthUser, raw_id: &str) -> Result<(), AuthError> {
        let id = Uuid::parse_str(raw_id).map_err(|_| self.not_found())?;

        let resource = self
            .lookup
            .find_owner(id)
            .await
            .map_err(AuthError::Store)?
            .ok_or_else(|| self.not_found())?;

        if auth_user.role() == Role::Admin {
            return Ok(());
        }

        if resource.owner_id != auth_user.id().into_inner() {
            debug!(
                user_id = %auth_user.id(),
                resource = self.resource,
                resource_id = %resource.id,
                "Ownership check failed"
            );
            return Err(AuthError::Forbidden(format!(
                "You can only modify your own {}",
                self.resource.to_lowercase()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::middleware::role::tests::auth_user_with;

    struct FixedOwners(HashMap<Uuid, Uuid>);

    #[async_trait]
    impl ResourceLookup for FixedOwners {
        async fn find_owner(&self, id: Uuid) -> Result<Option<ResourceOwner>, AppError> {
            Ok(self
                .0
                .get(&id)
                .map(|owner_id| ResourceOwner { id, owner_id: *owner_id }))
        }
    }

    fn requirement(resource_id: Uuid, owner_id: Uuid) -> OwnershipRequirement {
        let owners = HashMap::from([(resource_id, owner_id)]);
        OwnershipRequirement::new("Product", Arc::new(FixedOwners(owners)))
    }

    #[tokio::test]
    async fn test_owner_passes() {
        let owner = auth_user_with(Role::Seller);
        let resource_id = Uuid::new_v4();
        let requirement = requirement(resource_id, owner.id().into_inner());

        assert!(requirement.check(&owner, &resource_id.to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_principal_is_forbidden() {
        let owner = auth_user_with(Role::Seller);
        let intruder = auth_user_with(Role::Seller);
        let resource_id = Uuid::new_v4();
        let requirement = requirement(resource_id, owner.id().into_inner());

        let err = requirement
            .check(&intruder, &resource_id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_bypasses_ownership() {
        let owner = auth_user_with(Role::Seller);
        let admin = auth_user_with(Role::Admin);
        let resource_id = Uuid::new_v4();
        let requirement = requirement(resource_id, owner.id().into_inner());

        assert!(requirement.check(&admin, &resource_id.to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_absent_resource_is_not_found_even_for_admin() {
        let admin = auth_user_with(Role::Admin);
        let requirement = requirement(Uuid::new_v4(), Uuid::new_v4());

        let err = requirement
            .check(&admin, &Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unparsable_id_is_not_found() {
        let owner = auth_user_with(Role::Seller);
        let requirement = requirement(Uuid::new_v4(), owner.id().into_inner());

        let err = requirement.check(&owner, "bukan-uuid").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
