//! # Lestari DB
//!
//! Postgres connection pool, embedded migrations, and rendering of
//! [`QuerySpec`]s into SQL.
//!
//! # Example
//!
//! ```ignore
//! use lestari_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url).await?;
//! run_migrations(&pool).await?;
//! ```
//!
//! [`QuerySpec`]: lestari_core::query::QuerySpec

pub mod render;

use sqlx::postgres::PgPoolOptions;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

pub use render::{push_filters, push_order_by, push_page_window};

/// Connects to Postgres at `database_url`.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Applies the migrations under `migrations/` that have not run yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
