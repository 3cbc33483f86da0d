//! Persistence.
//!
//! Handlers and services only see the [`UserStore`] and [`ProductStore`]
//! traits. Two backends implement both: [`PostgresStore`] (selected by
//! `DATABASE_URL`) and [`MemoryStore`] (development and tests).
//!
//! Plain-text secrets never reach a backend's storage: every insert and
//! every secret replacement goes through [`prepare_credentials`] first.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lestari_core::query::QuerySpec;
use lestari_core::{AppError, Role, hash_password_with_cost};
use lestari_models::{Product, ProductId, Review, SellerInfo, User, UserCredentials, UserId};

use crate::middleware::ownership::{ResourceLookup, ResourceOwner};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// A principal about to be registered. `password` is plain text.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
    pub seller_info: Option<SellerInfo>,
}

/// Whether a save also replaces the stored secret.
#[derive(Debug, Clone, Default)]
pub enum SecretChange {
    #[default]
    Keep,
    /// New plain-text password.
    Replace(String),
}

/// A secret ready to persist.
#[derive(Debug, Clone)]
pub struct PreparedSecret {
    pub password_hash: String,
    /// Set when an existing principal's secret is replaced; tokens issued
    /// before this instant are refused from then on.
    pub changed_at: Option<DateTime<Utc>>,
}

/// Hashes a plain-text secret before it is persisted.
pub fn prepare_credentials(
    plain: &str,
    replacing_existing: bool,
    bcrypt_cost: u32,
) -> Result<PreparedSecret, AppError> {
    Ok(PreparedSecret {
        password_hash: hash_password_with_cost(plain, bcrypt_cost)?,
        changed_at: replacing_existing.then(Utc::now),
    })
}

/// Emails are unique case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn duplicate_email() -> AppError {
    AppError::bad_request(anyhow::anyhow!("Email is already registered"))
}

pub fn duplicate_review() -> AppError {
    AppError::bad_request(anyhow::anyhow!("You have already reviewed this product"))
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Lookup for login; the only read that returns the password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    /// Fails with 400 when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    /// Persists profile, role and status fields of `user`, and the secret
    /// when `secret` says so.
    async fn save(&self, user: &User, secret: SecretChange) -> Result<User, AppError>;

    async fn list(&self, spec: &QuerySpec) -> Result<Vec<User>, AppError>;

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> Result<Product, AppError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError>;

    async fn find_owner(&self, id: ProductId) -> Result<Option<UserId>, AppError>;

    async fn list(&self, spec: &QuerySpec) -> Result<Vec<Product>, AppError>;

    /// Writes every mutable field, bumps `version` and `updated_at`.
    async fn update(&self, product: &Product) -> Result<Product, AppError>;

    /// Returns whether a product was removed.
    async fn delete(&self, id: ProductId) -> Result<bool, AppError>;

    /// Attaches a review and refreshes the product's rating. Fails with 400
    /// when the reviewer already reviewed the product.
    async fn add_review(&self, id: ProductId, review: Review) -> Result<Option<Product>, AppError>;
}

/// Ownership lookups for product routes.
#[derive(Clone)]
pub struct ProductOwners(pub Arc<dyn ProductStore>);

#[async_trait]
impl ResourceLookup for ProductOwners {
    async fn find_owner(&self, id: uuid::Uuid) -> Result<Option<ResourceOwner>, AppError> {
        let owner = self.0.find_owner(ProductId::from(id)).await?;
        Ok(owner.map(|owner_id| ResourceOwner {
            id,
            owner_id: owner_id.into_inner(),
        }))
    }
}
