//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! range categories
//! range category 0b6c3a0e-...
//! range product 5f1e9d2a-...
//! ```

#![allow(clippy::print_stdout)]

use range_core::{CategoryId, ProductId};
use range_storefront::{Result, Storefront};

use crate::render;

/// List every category.
pub async fn categories(storefront: &Storefront) -> Result<()> {
    let categories = storefront.catalog().categories().await?;
    println!("{}", render::categories(&categories));
    Ok(())
}

/// Show one category and its products.
pub async fn category(storefront: &Storefront, id: &str) -> Result<()> {
    let category = storefront.catalog().category(&CategoryId::new(id)).await?;
    println!("{}", render::category(&category));
    Ok(())
}

/// Show one product.
pub async fn product(storefront: &Storefront, id: &str) -> Result<()> {
    let product = storefront.catalog().product(&ProductId::new(id)).await?;
    println!("{}", render::product(&product));
    Ok(())
}
