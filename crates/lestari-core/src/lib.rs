//! # Lestari Core
//!
//! Core types, errors, and utilities for the Lestari marketplace API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page window resolution for collection reads
//! - [`password`]: Password hashing and verification
//! - [`query`]: The query feature builder (filter, sort, projection, paging)
//! - [`roles`]: Marketplace roles (`client`, `seller`, `admin`)
//! - [`serde`]: Deserialization helpers for request bodies
//!
//! # Example
//!
//! ```ignore
//! use lestari_core::query::{QueryFeatures, QueryOptions, QueryParams};
//!
//! let spec = QueryFeatures::new(&params, &PRODUCT_SCHEMA, QueryOptions::default())
//!     .filter()?
//!     .sort()?
//!     .limit_fields()?
//!     .paginate()
//!     .build();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod query;
pub mod roles;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::PageWindow;
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use roles::Role;
