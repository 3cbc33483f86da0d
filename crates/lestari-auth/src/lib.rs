//! # Lestari Auth
//!
//! Signed, time-bound bearer tokens for the Lestari API.
//!
//! - [`claims`]: the JWT claim set (`sub`, `role`, `iat`, `exp`)
//! - [`jwt`]: [`TokenService`], which issues and verifies tokens
//!
//! Tokens are stateless: nothing is stored when one is issued and there is
//! no revocation list. A token stops being accepted when it expires or when
//! the principal's credential changes after it was issued (checked by the
//! authentication middleware, not here).
//!
//! # Example
//!
//! ```ignore
//! use lestari_auth::TokenService;
//! use lestari_config::JwtConfig;
//!
//! let tokens = TokenService::new(&JwtConfig::from_env());
//! let token = tokens.issue_access_token(user_id, Role::Seller)?;
//! let verified = tokens.verify(&token)?;
//! assert_eq!(verified.principal_id, user_id);
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{TokenError, TokenService, VerifiedToken};
