use std::sync::Arc;

use tracing::warn;

use lestari_auth::TokenService;
use lestari_config::{CorsConfig, JwtConfig, QueryConfig, ServerConfig};
use lestari_core::query::{FilterPolicy, QueryOptions};
use lestari_db::{init_db_pool, run_migrations};

use crate::store::{MemoryStore, PostgresStore, ProductStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub tokens: TokenService,
    pub cors_config: CorsConfig,
    pub query_config: QueryConfig,
    pub server_config: ServerConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("cors_config", &self.cors_config)
            .field("query_config", &self.query_config)
            .field("server_config", &self.server_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds state over the given stores with configuration read from the
    /// environment.
    pub fn new(users: Arc<dyn UserStore>, products: Arc<dyn ProductStore>) -> Self {
        Self {
            users,
            products,
            tokens: TokenService::new(&JwtConfig::from_env()),
            cors_config: CorsConfig::from_env(),
            query_config: QueryConfig::from_env(),
            server_config: ServerConfig::from_env(),
        }
    }

    /// Builder options for collection reads.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            policy: if self.query_config.strict_filters {
                FilterPolicy::Strict
            } else {
                FilterPolicy::Permissive
            },
            default_limit: self.query_config.default_limit,
            max_limit: self.query_config.max_limit,
        }
    }
}

/// Selects the store from `DATABASE_URL`: Postgres when set (migrations are
/// applied on connect), the in-memory store otherwise.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let bcrypt_cost = ServerConfig::from_env().bcrypt_cost;

    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = init_db_pool(&url).await?;
            run_migrations(&pool).await?;

            let store = Arc::new(PostgresStore::new(pool, bcrypt_cost));
            Ok(AppState::new(store.clone(), store))
        }
        Err(_) => {
            warn!("DATABASE_URL not set, using in-memory store; data will not persist");
            let store = Arc::new(MemoryStore::new(bcrypt_cost));
            Ok(AppState::new(store.clone(), store))
        }
    }
}
