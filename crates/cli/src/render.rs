//! Plain-text rendering of storefront data.
//!
//! Everything here returns a `String`; printing is left to the commands.

use std::fmt::Write;

use range_core::Price;
use range_storefront::api::types::{Cart, Category, Order, Product};
use range_storefront::services::AuthState;

pub fn categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories.".to_string();
    }

    let mut out = String::new();
    for category in categories {
        let _ = writeln!(
            out,
            "{}  {} ({} products)",
            category.id, category.title, category.products_count
        );
    }
    out
}

pub fn category(category: &Category) -> String {
    let mut out = format!("{}\n", category.title);
    if !category.description.is_empty() {
        let _ = writeln!(out, "{}", category.description);
    }
    out.push('\n');
    if category.products.is_empty() {
        out.push_str("No products in this category.\n");
    }
    for product in &category.products {
        let _ = writeln!(out, "{}", product_line(product));
    }
    out
}

fn product_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  [out of stock]" };
    format!("{}  {}  {}{stock}", product.id, product.title, product.price)
}

pub fn product(product: &Product) -> String {
    let mut out = format!("{}\n{}\n", product.title, product.price);
    if let Some(brand) = &product.brand {
        let _ = writeln!(out, "Brand: {brand}");
    }
    if let Some(category) = &product.category_title {
        let _ = writeln!(out, "Category: {category}");
    }
    if let Some(rating) = product.rating {
        let _ = writeln!(out, "Rating: {rating}");
    }
    match (product.in_stock, product.stock_quantity) {
        (false, _) => out.push_str("Out of stock\n"),
        (true, Some(count)) => {
            let _ = writeln!(out, "In stock: {count}");
        }
        (true, None) => out.push_str("In stock\n"),
    }
    if !product.description.is_empty() {
        let _ = write!(out, "\n{}\n", product.description);
    }
    out
}

pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = String::new();
    for item in &cart.items {
        let _ = writeln!(
            out,
            "{}  {} x{}  {}",
            item.id,
            item.product_title,
            item.quantity,
            item.line_total()
        );
    }

    let total = cart.total.unwrap_or_else(|| {
        cart.items
            .iter()
            .map(range_storefront::api::types::CartItem::line_total)
            .fold(Price::ZERO, |acc, line| Price::new(acc.amount() + line.amount()))
    });
    let _ = write!(out, "Total: {total}");
    out
}

pub fn order(order: &Order) -> String {
    let mut out = format!("Order {} ({})\n", order.id, order.status);
    if let Some(created_at) = order.created_at {
        let _ = writeln!(out, "Placed: {}", created_at.format("%Y-%m-%d %H:%M"));
    }
    let _ = writeln!(out, "Ship to: {}", order.shipping_address);
    for item in &order.items {
        let _ = writeln!(
            out,
            "  {} x{}  {}",
            item.product_title, item.quantity, item.unit_price
        );
    }
    if let Some(total) = order.total_amount.or(order.total) {
        let _ = write!(out, "Total: {total}");
    }
    out
}

pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.".to_string();
    }

    let mut out = String::new();
    for order in orders {
        let total = order
            .total_amount
            .or(order.total)
            .map(|t| t.to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "{}  {}  {total}", order.id, order.status);
    }
    out
}

pub fn auth_state(state: &AuthState, cached_username: Option<&str>) -> String {
    match state {
        AuthState::Authenticated(user) => format!("Logged in as {}", user.display_name()),
        AuthState::Anonymous => match cached_username {
            Some(name) => format!("Not logged in (last user: {name})"),
            None => "Not logged in".to_string(),
        },
        AuthState::Unknown => "Checking session...".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use range_core::{CartItemId, Quantity};
    use range_storefront::api::types::CartItem;

    use super::*;

    fn line(id: &str, quantity: u32, minor: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: None,
            product_title: "Kettle".to_string(),
            unit_price: Price::from_minor(minor),
            quantity: Quantity::new(quantity).unwrap(),
            added_at: None,
        }
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(cart(&Cart::default()), "Your cart is empty.");
    }

    #[test]
    fn test_cart_prefers_server_total() {
        let rendered = cart(&Cart {
            items: vec![line("item-1", 2, 45_000)],
            total: Some(Price::from_minor(1)),
        });
        assert!(rendered.contains("item-1  Kettle x2  900.00 ₴"));
        assert!(rendered.ends_with("Total: 0.01 ₴"));
    }

    #[test]
    fn test_cart_sums_lines_without_server_total() {
        let rendered = cart(&Cart {
            items: vec![line("item-1", 2, 100), line("item-2", 1, 50)],
            total: None,
        });
        assert!(rendered.ends_with("Total: 2.50 ₴"));
    }

    #[test]
    fn test_auth_state_mentions_cached_username() {
        assert_eq!(
            auth_state(&AuthState::Anonymous, Some("a@b.com")),
            "Not logged in (last user: a@b.com)"
        );
        assert_eq!(auth_state(&AuthState::Anonymous, None), "Not logged in");
    }
}
