//! Range API endpoint paths.
//!
//! Identifiers are percent-encoded before interpolation. Every path keeps
//! the trailing slash the server routes on.

use range_core::{CartItemId, CategoryId, OrderId, ProductId};

pub const CATEGORIES: &str = "/api/catalog/categories/";
pub const LOGIN: &str = "/api/users/login/";
pub const REGISTER: &str = "/api/users/register/";
pub const PROFILE: &str = "/api/users/profile/";
pub const CART: &str = "/api/cart/";
pub const CART_ITEMS: &str = "/api/cart/items/";
pub const ORDERS: &str = "/api/orders/";
pub const CREATE_ORDER_FROM_CART: &str = "/api/orders/create-from-cart/";

#[must_use]
pub fn category(id: &CategoryId) -> String {
    format!("{CATEGORIES}{}/", urlencoding::encode(id.as_str()))
}

#[must_use]
pub fn product(id: &ProductId) -> String {
    format!("/api/catalog/products/{}/", urlencoding::encode(id.as_str()))
}

#[must_use]
pub fn cart_item(id: &CartItemId) -> String {
    format!("{CART_ITEMS}{}/", urlencoding::encode(id.as_str()))
}

#[must_use]
pub fn order(id: &OrderId) -> String {
    format!("{ORDERS}{}/", urlencoding::encode(id.as_str()))
}
