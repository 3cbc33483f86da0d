//! In-process store used when no database is configured, and by the test
//! suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use lestari_core::AppError;
use lestari_core::query::QuerySpec;
use lestari_models::users::DEFAULT_PROFILE_PICTURE;
use lestari_models::{Product, ProductId, Review, User, UserCredentials, UserId};

use super::{
    NewUser, ProductStore, SecretChange, UserStore, duplicate_email, duplicate_review,
    normalize_email, prepare_credentials,
};

#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserCredentials>>,
    products: RwLock<HashMap<ProductId, Product>>,
    bcrypt_cost: u32,
}

impl MemoryStore {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            bcrypt_cost,
        }
    }
}

fn query_error(err: serde_json::Error) -> AppError {
    AppError::internal(err)
}

/// Oldest first, then by id, so that ties under the requested order are
/// broken the same way on every read.
fn stable_order<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, uuid::Uuid)) {
    rows.sort_by_key(|row| key(row));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|stored| stored.user.email == email).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let email = normalize_email(&new_user.email);
        let secret = prepare_credentials(&new_user.password, false, self.bcrypt_cost)?;

        let mut users = self.users.write().await;
        if users.values().any(|stored| stored.user.email == email) {
            return Err(duplicate_email());
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: new_user.name,
            email,
            phone: new_user.phone,
            role: new_user.role,
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            seller_info: new_user.seller_info,
            is_active: true,
            last_login: None,
            credential_changed_at: None,
            created_at: now,
            updated_at: now,
        };

        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: secret.password_hash,
            },
        );
        Ok(user)
    }

    async fn save(&self, user: &User, secret: SecretChange) -> Result<User, AppError> {
        let prepared = match secret {
            SecretChange::Keep => None,
            SecretChange::Replace(plain) => {
                Some(prepare_credentials(&plain, true, self.bcrypt_cost)?)
            }
        };

        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        let mut updated = user.clone();
        updated.email = stored.user.email.clone();
        updated.created_at = stored.user.created_at;
        updated.credential_changed_at = stored.user.credential_changed_at;
        updated.updated_at = Utc::now();

        if let Some(prepared) = prepared {
            stored.password_hash = prepared.password_hash;
            updated.credential_changed_at = prepared.changed_at;
        }

        stored.user = updated.clone();
        Ok(updated)
    }

    async fn list(&self, spec: &QuerySpec) -> Result<Vec<User>, AppError> {
        let mut rows: Vec<User> = {
            let users = self.users.read().await;
            users.values().map(|stored| stored.user.clone()).collect()
        };
        stable_order(&mut rows, |user| (user.created_at, user.id.into_inner()));

        spec.execute(rows).map_err(query_error)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if let Some(stored) = users.get_mut(&id) {
            stored.user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert(&self, product: Product) -> Result<Product, AppError> {
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn find_owner(&self, id: ProductId) -> Result<Option<UserId>, AppError> {
        let products = self.products.read().await;
        Ok(products.get(&id).map(|product| product.seller_id))
    }

    async fn list(&self, spec: &QuerySpec) -> Result<Vec<Product>, AppError> {
        let mut rows: Vec<Product> = {
            let products = self.products.read().await;
            products.values().cloned().collect()
        };
        stable_order(&mut rows, |product| {
            (product.created_at, product.id.into_inner())
        });

        spec.execute(rows).map_err(query_error)
    }

    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        let mut products = self.products.write().await;
        let stored = products
            .get_mut(&product.id)
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Product not found")))?;

        let mut updated = product.clone();
        updated.seller_id = stored.seller_id;
        updated.reviews = stored.reviews.clone();
        updated.created_at = stored.created_at;
        updated.version = stored.version + 1;
        updated.updated_at = Utc::now();
        updated.refresh_rating();

        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, AppError> {
        let mut products = self.products.write().await;
        Ok(products.remove(&id).is_some())
    }

    async fn add_review(&self, id: ProductId, review: Review) -> Result<Option<Product>, AppError> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };

        if product.has_review_from(review.user_id) {
            return Err(duplicate_review());
        }

        product.reviews.push(review);
        product.refresh_rating();
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }
}
