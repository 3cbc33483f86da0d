//! Access policies: authentication, then role, then ownership.
//!
//! A policy is plain configuration. It is bound to the app state and
//! installed on a router with `route_layer`, so it runs only for requests
//! that matched one of that router's routes:
//!
//! ```ignore
//! let policy = AccessPolicy::roles(&[Role::Seller, Role::Admin])
//!     .with_ownership(OwnershipRequirement::new("Product", owners));
//!
//! Router::new()
//!     .route("/{id}", delete(delete_product))
//!     .route_layer(middleware::from_fn_with_state(policy.bind(state), enforce_policy))
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

use lestari_core::{AppError, Role};

use crate::middleware::auth::{AuthError, AuthUser, authenticate};
use crate::middleware::ownership::OwnershipRequirement;
use crate::middleware::role::RoleRequirement;
use crate::state::AppState;

/// Path parameter naming the resource an ownership check applies to.
const RESOURCE_ID_PARAM: &str = "id";

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    pub roles: RoleRequirement,
    pub ownership: Option<OwnershipRequirement>,
}

impl AccessPolicy {
    /// Any authenticated principal.
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles(roles: &[Role]) -> Self {
        Self {
            roles: RoleRequirement::one_of(roles),
            ownership: None,
        }
    }

    pub fn with_ownership(mut self, ownership: OwnershipRequirement) -> Self {
        self.ownership = Some(ownership);
        self
    }

    /// Runs the role check, then the ownership check against `resource_id`.
    pub async fn evaluate(
        &self,
        auth_user: &AuthUser,
        resource_id: Option<&str>,
    ) -> Result<(), AuthError> {
        self.roles.check(auth_user)?;

        if let Some(ownership) = &self.ownership {
            let raw_id = resource_id.ok_or_else(|| {
                AuthError::NotFound(format!("{} not found", ownership.resource))
            })?;
            ownership.check(auth_user, raw_id).await?;
        }

        Ok(())
    }

    pub fn bind(self, app: AppState) -> PolicyState {
        PolicyState {
            app,
            policy: Arc::new(self),
        }
    }
}

/// A policy together with the state it authenticates against.
#[derive(Clone)]
pub struct PolicyState {
    pub app: AppState,
    pub policy: Arc<AccessPolicy>,
}

/// Authenticates the request and evaluates the bound policy. The resolved
/// [`AuthUser`] is stored in the request extensions for the handler.
pub async fn enforce_policy(
    State(state): State<PolicyState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = authenticate(&parts.headers, &state.app.tokens, state.app.users.as_ref()).await?;

    let resource_id = RawPathParams::from_request_parts(&mut parts, &())
        .await
        .ok()
        .and_then(|params| {
            params
                .iter()
                .find(|(name, _)| *name == RESOURCE_ID_PARAM)
                .map(|(_, value)| value.to_string())
        });

    state
        .policy
        .evaluate(&auth_user, resource_id.as_deref())
        .await?;

    parts.extensions.insert(auth_user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::middleware::ownership::{ResourceLookup, ResourceOwner};
    use crate::middleware::role::tests::auth_user_with;

    struct SingleOwner(ResourceOwner);

    #[async_trait]
    impl ResourceLookup for SingleOwner {
        async fn find_owner(&self, id: Uuid) -> Result<Option<ResourceOwner>, AppError> {
            Ok((id == self.0.id).then_some(self.0))
        }
    }

    #[tokio::test]
    async fn test_role_check_runs_before_ownership() {
        let owner = auth_user_with(Role::Client);
        let resource = ResourceOwner {
            id: Uuid::new_v4(),
            owner_id: owner.id().into_inner(),
        };
        let policy = AccessPolicy::roles(&[Role::Seller, Role::Admin])
            .with_ownership(OwnershipRequirement::new("Product", Arc::new(SingleOwner(resource))));

        // Owns the resource but lacks the role
        let err = policy
            .evaluate(&owner, Some(&resource.id.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_authenticated_policy_admits_everyone() {
        let policy = AccessPolicy::authenticated();
        for role in Role::ALL {
            assert!(policy.evaluate(&auth_user_with(role), None).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_ownership_without_path_id_is_not_found() {
        let seller = auth_user_with(Role::Seller);
        let resource = ResourceOwner {
            id: Uuid::new_v4(),
            owner_id: seller.id().into_inner(),
        };
        let policy = AccessPolicy::authenticated()
            .with_ownership(OwnershipRequirement::new("Product", Arc::new(SingleOwner(resource))));

        let err = policy.evaluate(&seller, None).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
