//! Postgres-backed store.
//!
//! Queries are built at runtime with `sqlx::query_as` / `QueryBuilder`, so
//! no database is needed at compile time. Collection reads are rendered
//! from a [`QuerySpec`] by `lestari_db::render`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use lestari_core::query::QuerySpec;
use lestari_core::{AppError, Role};
use lestari_db::{push_filters, push_order_by, push_page_window};
use lestari_models::{
    Category, Product, ProductId, Review, ReviewId, SellerInfo, User, UserCredentials, UserId,
};

use super::{
    NewUser, ProductStore, SecretChange, UserStore, duplicate_email, duplicate_review,
    normalize_email, prepare_credentials,
};

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, profile_picture, \
    seller_info, is_active, last_login, credential_changed_at, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, slug, description, seller_id, seller_name, \
    seller_location, category, sub_category, price, discount_price, discount_percentage, \
    stock, weight, unit, images, materials, colors, tags, is_featured, is_available, rating, \
    num_reviews, version, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl PostgresStore {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    async fn reviews_for(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<Review>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, product_id, user_id, name, rating, comment, created_at \
             FROM product_reviews WHERE product_id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::database)?;

        let mut grouped: HashMap<ProductId, Vec<Review>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn with_reviews(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, AppError> {
        let ids: Vec<ProductId> = rows.iter().map(|row| row.id).collect();
        let mut reviews = self.reviews_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let reviews = reviews.remove(&row.id).unwrap_or_default();
                row.into_product(reviews)
            })
            .collect()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[derive(FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    phone: String,
    password_hash: String,
    role: String,
    profile_picture: String,
    seller_info: Option<Json<SellerInfo>>,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    credential_changed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserCredentials {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(AppError::internal)?;

        Ok(UserCredentials {
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                phone: row.phone,
                role,
                profile_picture: row.profile_picture,
                seller_info: row.seller_info.map(|Json(info)| info),
                is_active: row.is_active,
                last_login: row.last_login,
                credential_changed_at: row.credential_changed_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        })
    }
}

fn into_user(row: UserRow) -> Result<User, AppError> {
    UserCredentials::try_from(row).map(|credentials| credentials.user)
}

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: String,
    seller_id: UserId,
    seller_name: String,
    seller_location: String,
    category: String,
    sub_category: Option<String>,
    price: f64,
    discount_price: Option<f64>,
    discount_percentage: Option<i32>,
    stock: i32,
    weight: f64,
    unit: String,
    images: Vec<String>,
    materials: Vec<String>,
    colors: Vec<String>,
    tags: Vec<String>,
    is_featured: bool,
    is_available: bool,
    rating: f64,
    num_reviews: i32,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, reviews: Vec<Review>) -> Result<Product, AppError> {
        let category = self
            .category
            .parse::<Category>()
            .map_err(|err| AppError::internal(anyhow::anyhow!(err)))?;

        Ok(Product {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            seller_id: self.seller_id,
            seller_name: self.seller_name,
            seller_location: self.seller_location,
            category,
            sub_category: self.sub_category,
            price: self.price,
            discount_price: self.discount_price,
            discount_percentage: self.discount_percentage,
            stock: self.stock,
            weight: self.weight,
            unit: self.unit,
            images: self.images,
            materials: self.materials,
            colors: self.colors,
            tags: self.tags,
            is_featured: self.is_featured,
            is_available: self.is_available,
            rating: self.rating,
            num_reviews: self.num_reviews,
            reviews,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    name: String,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::database)?;

        row.map(into_user).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::database)?;

        row.map(UserCredentials::try_from).transpose()
    }

    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role))]
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let secret = prepare_credentials(&user.password, false, self.bcrypt_cost)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, phone, password_hash, role, seller_info) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(UserId::new())
        .bind(&user.name)
        .bind(normalize_email(&user.email))
        .bind(&user.phone)
        .bind(&secret.password_hash)
        .bind(user.role.as_str())
        .bind(user.seller_info.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_email()
            } else {
                AppError::database(err)
            }
        })?;

        into_user(row)
    }

    #[instrument(skip(self, user, secret), fields(user_id = %user.id))]
    async fn save(&self, user: &User, secret: SecretChange) -> Result<User, AppError> {
        let prepared = match secret {
            SecretChange::Keep => None,
            SecretChange::Replace(plain) => {
                Some(prepare_credentials(&plain, true, self.bcrypt_cost)?)
            }
        };
        let (password_hash, changed_at) = match prepared {
            Some(prepared) => (Some(prepared.password_hash), prepared.changed_at),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET name = $1, phone = $2, role = $3, profile_picture = $4, \
             seller_info = $5, is_active = $6, \
             password_hash = COALESCE($7, password_hash), \
             credential_changed_at = COALESCE($8, credential_changed_at), \
             updated_at = NOW() \
             WHERE id = $9 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.profile_picture)
        .bind(user.seller_info.clone().map(Json))
        .bind(user.is_active)
        .bind(password_hash)
        .bind(changed_at)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        into_user(row)
    }

    #[instrument(skip(self, spec))]
    async fn list(&self, spec: &QuerySpec) -> Result<Vec<User>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        push_filters(&mut builder, &spec.filters);
        push_order_by(&mut builder, &spec.sort);
        push_page_window(&mut builder, &spec.page);

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::database)?;

        rows.into_iter().map(into_user).collect()
    }

    #[instrument(skip(self))]
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::database)?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id, seller_id = %product.seller_id))]
    async fn insert(&self, product: Product) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (id, name, slug, description, seller_id, seller_name, \
             seller_location, category, sub_category, price, discount_price, \
             discount_percentage, stock, weight, unit, images, materials, colors, tags, \
             is_featured, is_available, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.seller_id)
        .bind(&product.seller_name)
        .bind(&product.seller_location)
        .bind(product.category.as_str())
        .bind(&product.sub_category)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.discount_percentage)
        .bind(product.stock)
        .bind(product.weight)
        .bind(&product.unit)
        .bind(&product.images)
        .bind(&product.materials)
        .bind(&product.colors)
        .bind(&product.tags)
        .bind(product.is_featured)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::database)?;

        row.into_product(Vec::new())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::database)?;

        match row {
            Some(row) => Ok(self.with_reviews(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_owner(&self, id: ProductId) -> Result<Option<UserId>, AppError> {
        sqlx::query_scalar::<_, UserId>("SELECT seller_id FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::database)
    }

    #[instrument(skip(self, spec))]
    async fn list(&self, spec: &QuerySpec) -> Result<Vec<Product>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM products WHERE TRUE",
            PRODUCT_COLUMNS
        ));
        push_filters(&mut builder, &spec.filters);
        push_order_by(&mut builder, &spec.sort);
        push_page_window(&mut builder, &spec.page);

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::database)?;

        self.with_reviews(rows).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update(&self, product: &Product) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET name = $1, slug = $2, description = $3, category = $4, \
             sub_category = $5, price = $6, discount_price = $7, discount_percentage = $8, \
             stock = $9, weight = $10, unit = $11, images = $12, materials = $13, \
             colors = $14, tags = $15, is_featured = $16, is_available = $17, \
             version = version + 1, updated_at = NOW() \
             WHERE id = $18 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.category.as_str())
        .bind(&product.sub_category)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.discount_percentage)
        .bind(product.stock)
        .bind(product.weight)
        .bind(&product.unit)
        .bind(&product.images)
        .bind(&product.materials)
        .bind(&product.colors)
        .bind(&product.tags)
        .bind(product.is_featured)
        .bind(product.is_available)
        .bind(product.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Product not found")))?;

        let mut updated = self.with_reviews(vec![row]).await?;
        updated
            .pop()
            .ok_or_else(|| AppError::internal_error("Updated product vanished"))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::database)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, review), fields(user_id = %review.user_id))]
    async fn add_review(&self, id: ProductId, review: Review) -> Result<Option<Product>, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::database)?;
        if !exists {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO product_reviews (id, product_id, user_id, name, rating, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(review.id)
        .bind(id)
        .bind(review.user_id)
        .bind(&review.name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_review()
            } else {
                AppError::database(err)
            }
        })?;

        sqlx::query(
            "UPDATE products SET \
             rating = COALESCE((SELECT AVG(rating)::FLOAT8 FROM product_reviews WHERE product_id = $1), 0), \
             num_reviews = (SELECT COUNT(*)::INT4 FROM product_reviews WHERE product_id = $1), \
             updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::database)?;

        ProductStore::find_by_id(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lestari_models::{Category, CreateProductDto, CreateReviewDto};

    use crate::modules::products::service::ProductService;
    use crate::store::NewUser;

    async fn create_user(store: &PostgresStore, email: &str, role: Role) -> User {
        UserStore::insert(
            store,
            NewUser {
                name: "Sari".to_string(),
                email: email.to_string(),
                phone: "08123456789".to_string(),
                password: "rahasia123".to_string(),
                role,
                seller_info: (role == Role::Seller).then(|| SellerInfo::default_for("Sari")),
            },
        )
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_add_review_refreshes_rating(pool: PgPool) {
        let store = PostgresStore::new(pool, 4);
        let seller = create_user(&store, "sari@example.com", Role::Seller).await;
        let reviewer = create_user(&store, "budi@example.com", Role::Client).await;

        let product = ProductService::create(
            &store,
            &seller,
            CreateProductDto {
                name: "Tas Anyaman".to_string(),
                description: "Anyaman pandan".to_string(),
                category: Category::Kerajinan,
                sub_category: None,
                price: 150.0,
                discount_price: None,
                stock: 5,
                weight: 0.4,
                unit: None,
                images: vec!["tas.jpg".to_string()],
                materials: vec![],
                colors: vec![],
                tags: vec![],
                is_featured: false,
                is_available: None,
            },
        )
        .await
        .unwrap();

        let reviewed = ProductService::add_review(
            &store,
            product.id,
            &reviewer,
            CreateReviewDto {
                rating: 4,
                comment: Some("Rapi".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(reviewed.num_reviews, 1);
        assert_eq!(reviewed.rating, 4.0);
        assert_eq!(reviewed.reviews.len(), 1);

        let duplicate = ProductService::add_review(
            &store,
            product.id,
            &reviewer,
            CreateReviewDto {
                rating: 1,
                comment: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(duplicate.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
