use serde_json::Value;
use tracing::instrument;

use lestari_core::AppError;
use lestari_core::query::QuerySpec;
use lestari_models::{User, UserId};

use crate::store::UserStore;

pub struct UserService;

impl UserService {
    /// Users matching `spec`, projected. Password hashes never leave the
    /// store on this path.
    #[instrument(skip(users, spec))]
    pub async fn list(users: &dyn UserStore, spec: &QuerySpec) -> Result<Vec<Value>, AppError> {
        users
            .list(spec)
            .await?
            .iter()
            .map(|user| spec.project(user))
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::internal)
    }

    #[instrument(skip(users))]
    pub async fn get(users: &dyn UserStore, id: UserId) -> Result<User, AppError> {
        users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }
}
