//! Catalog reads.
//!
//! Categories and products are public and change rarely, so responses are
//! cached in memory for the configured TTL. Cart and order data never goes
//! through this cache.

use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use range_core::{CategoryId, ProductId};

use crate::api::types::{Category, Listing, Product};
use crate::api::{ApiClient, paths};
use crate::error::Result;

const CACHE_CAPACITY: u64 = 1000;

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Category(CategoryId),
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Vec<Category>),
    Category(Box<Category>),
    Product(Box<Product>),
}

/// Catalog client with a response cache.
#[derive(Clone)]
pub struct Catalog {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog whose responses stay cached for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { api, cache }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let listing: Listing<Category> = self.api.get(paths::CATEGORIES).await?;
        let categories = listing.into_items();

        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// A category with its products.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the request fails or the category
    /// does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: &CategoryId) -> Result<Category> {
        let key = CacheKey::Category(id.clone());
        if let Some(CacheValue::Category(category)) = self.cache.get(&key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let category: Category = self.api.get(&paths::category(id)).await?;

        self.cache
            .insert(key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the request fails or the product
    /// does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.api.get(&paths::product(id)).await?;

        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop every cached response.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
