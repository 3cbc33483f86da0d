use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use lestari_core::AppError;
use lestari_core::query::{
    CompareOp, FieldFilter, FieldKind, FilterValue, QueryOptions, QueryParams, QuerySpec,
    build_query_spec,
};
use lestari_models::{
    CreateProductDto, CreateReviewDto, PRODUCT_SCHEMA, Product, ProductId, Review, ReviewId,
    UpdateProductDto, User, discount_percentage, slugify,
};

use crate::store::ProductStore;

/// How many products the top-rated listing returns.
pub const TOP_RATED_LIMIT: &str = "5";

fn not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Product not found"))
}

fn project_all(spec: &QuerySpec, products: &[Product]) -> Result<Vec<Value>, AppError> {
    products
        .iter()
        .map(|product| spec.project(product))
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::internal)
}

/// Serializes one product with internal fields left out.
pub fn present(product: &Product) -> Result<Value, AppError> {
    serde_json::to_value(product)
        .map(|value| PRODUCT_SCHEMA.default_projection().apply(value))
        .map_err(AppError::internal)
}

/// Unparsable ids cannot name a product.
pub fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    Uuid::parse_str(raw)
        .map(ProductId::from)
        .map_err(|_| not_found())
}

pub struct ProductService;

impl ProductService {
    #[instrument(skip(products, seller, dto), fields(seller_id = %seller.id))]
    pub async fn create(
        products: &dyn ProductStore,
        seller: &User,
        dto: CreateProductDto,
    ) -> Result<Product, AppError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            slug: slugify(&dto.name),
            name: dto.name,
            description: dto.description,
            seller_id: seller.id,
            seller_name: seller.name.clone(),
            seller_location: seller.seller_location(),
            category: dto.category,
            sub_category: dto.sub_category,
            discount_percentage: discount_percentage(dto.price, dto.discount_price),
            price: dto.price,
            discount_price: dto.discount_price,
            stock: dto.stock,
            weight: dto.weight,
            unit: dto.unit.unwrap_or_else(|| "pcs".to_string()),
            images: dto.images,
            materials: dto.materials,
            colors: dto.colors,
            tags: dto.tags,
            is_featured: dto.is_featured,
            is_available: dto.is_available.unwrap_or(true),
            rating: 0.0,
            num_reviews: 0,
            reviews: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let product = products.insert(product).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(products, spec))]
    pub async fn list(products: &dyn ProductStore, spec: &QuerySpec) -> Result<Vec<Value>, AppError> {
        let rows = products.list(spec).await?;
        project_all(spec, &rows)
    }

    #[instrument(skip(products))]
    pub async fn top_rated(
        products: &dyn ProductStore,
        options: QueryOptions,
    ) -> Result<Vec<Value>, AppError> {
        let params = QueryParams::from([
            ("sort".to_string(), "-rating".to_string()),
            ("limit".to_string(), TOP_RATED_LIMIT.to_string()),
        ]);
        let spec = build_query_spec(&params, &PRODUCT_SCHEMA, options)?;
        Self::list(products, &spec).await
    }

    #[instrument(skip(products, params))]
    pub async fn list_by_seller(
        products: &dyn ProductStore,
        seller_id: Uuid,
        params: &QueryParams,
        options: QueryOptions,
    ) -> Result<Vec<Value>, AppError> {
        let spec = build_query_spec(params, &PRODUCT_SCHEMA, options)?.with_filter(FieldFilter {
            field: "seller_id",
            kind: FieldKind::Uuid,
            op: CompareOp::Eq,
            value: FilterValue::Uuid(seller_id),
        });
        Self::list(products, &spec).await
    }

    #[instrument(skip(products))]
    pub async fn get(products: &dyn ProductStore, id: ProductId) -> Result<Product, AppError> {
        products.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Applies a partial update. The discount percentage follows price and
    /// discount changes, and the discount must stay below the price.
    #[instrument(skip(products, dto))]
    pub async fn update(
        products: &dyn ProductStore,
        id: ProductId,
        dto: UpdateProductDto,
    ) -> Result<Product, AppError> {
        let mut product = Self::get(products, id).await?;
        let pricing_changed = dto.price.is_some() || dto.discount_price.is_some();

        if let Some(name) = dto.name {
            product.slug = slugify(&name);
            product.name = name;
        }
        if let Some(description) = dto.description {
            product.description = description;
        }
        if let Some(category) = dto.category {
            product.category = category;
        }
        if dto.sub_category.is_some() {
            product.sub_category = dto.sub_category;
        }
        if let Some(price) = dto.price {
            product.price = price;
        }
        if let Some(discount_price) = dto.discount_price {
            product.discount_price = discount_price;
        }
        if let Some(stock) = dto.stock {
            product.stock = stock;
        }
        if let Some(weight) = dto.weight {
            product.weight = weight;
        }
        if let Some(unit) = dto.unit {
            product.unit = unit;
        }
        if let Some(images) = dto.images {
            product.images = images;
        }
        if let Some(materials) = dto.materials {
            product.materials = materials;
        }
        if let Some(colors) = dto.colors {
            product.colors = colors;
        }
        if let Some(tags) = dto.tags {
            product.tags = tags;
        }
        if let Some(is_featured) = dto.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(is_available) = dto.is_available {
            product.is_available = is_available;
        }

        if pricing_changed {
            if product
                .discount_price
                .is_some_and(|discount| discount >= product.price)
            {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "Discount price must be lower than the price"
                )));
            }
            product.discount_percentage = discount_percentage(product.price, product.discount_price);
        }

        let product = products.update(&product).await?;
        info!(product_id = %product.id, version = product.version, "Product updated");
        Ok(product)
    }

    #[instrument(skip(products))]
    pub async fn delete(products: &dyn ProductStore, id: ProductId) -> Result<(), AppError> {
        if !products.delete(id).await? {
            return Err(not_found());
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(products, reviewer, dto), fields(user_id = %reviewer.id))]
    pub async fn add_review(
        products: &dyn ProductStore,
        id: ProductId,
        reviewer: &User,
        dto: CreateReviewDto,
    ) -> Result<Product, AppError> {
        let review = Review {
            id: ReviewId::new(),
            user_id: reviewer.id,
            name: reviewer.name.clone(),
            rating: dto.rating,
            comment: dto.comment,
            created_at: Utc::now(),
        };

        products.add_review(id, review).await?.ok_or_else(not_found)
    }
}
