//! # Lestari Config
//!
//! Configuration types for the Lestari API.
//!
//! Every structure is loaded from environment variables (a `.env` file is
//! read by `dotenvy` at startup) and falls back to development defaults:
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`cors`]: allowed browser origins
//! - [`query`]: limits and policy for the query feature builder
//! - [`server`]: bind address and password hashing cost
//!
//! # Example
//!
//! ```ignore
//! use lestari_config::{CorsConfig, JwtConfig, QueryConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let query_config = QueryConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod query;
pub mod server;

mod env;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use query::QueryConfig;
pub use server::ServerConfig;
