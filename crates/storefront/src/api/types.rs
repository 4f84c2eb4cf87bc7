//! Wire types for the Range REST API.
//!
//! One canonical schema: the server's snake_case field names. Optional
//! fields default so that older or trimmed-down responses still decode.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use range_core::{
    CartItemId, CategoryId, Email, OrderId, OrderStatus, Price, ProductId, Quantity,
};

// =============================================================================
// Catalog Types
// =============================================================================

/// Paginated list envelope used by catalog list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub results: Vec<T>,
    /// Total item count, when the server paginates.
    #[serde(default)]
    pub count: Option<u64>,
}

/// A list endpoint response: paginated `{results}` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    /// The listed items, whichever shape the server used.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.results,
            Self::Plain(items) => items,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub products_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Present on the category detail endpoint.
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A product as listed in a category or shown on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_title: Option<String>,
}

const fn default_true() -> bool {
    true
}

// =============================================================================
// User Types
// =============================================================================

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Token pair returned by a successful login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
}

/// Registration request body.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Profile endpoint response; the authoritative "who am I".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: Email,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// A line in the server-side cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_title: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl CartItem {
    /// Display-only line total.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity.get())
    }
}

/// The server-side cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Server-computed total, when provided.
    #[serde(default)]
    pub total: Option<Price>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity.get()))
    }
}

/// Add-to-cart request body.
#[derive(Debug, Serialize)]
pub struct AddCartItemRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: Quantity,
}

/// Quantity patch request body.
#[derive(Debug, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Quantity,
}

// =============================================================================
// Order Types
// =============================================================================

/// Create-from-cart request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

/// A line in a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_title: String,
    pub quantity: Quantity,
    pub unit_price: Price,
    #[serde(default)]
    pub subtotal: Option<Price>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: Option<Price>,
    /// Recomputed from the order lines by the server.
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
