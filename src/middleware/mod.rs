//! Request authentication and authorization.
//!
//! # Modules
//!
//! - [`auth`]: bearer token authentication and the [`auth::AuthUser`] extractor
//! - [`role`]: role requirements
//! - [`ownership`]: resource ownership requirements
//! - [`policy`]: [`policy::AccessPolicy`], composing the above into one
//!   route layer
//!
//! # Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The token is verified and the principal loaded from the user store;
//!    tokens issued before the principal's last password change are refused
//! 3. The route's policy checks the principal's role, then ownership of the
//!    `{id}` resource (admins bypass ownership)
//! 4. The handler receives the [`auth::AuthUser`] as an extractor

pub mod auth;
pub mod ownership;
pub mod policy;
pub mod role;
