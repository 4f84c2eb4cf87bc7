//! Integration tests for the cart controller.
//!
//! The server is authoritative: every successful mutation must be followed
//! by a reload, and the local cart only ever reflects a reload.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::Method;

use range_core::{CartItemId, ProductId, Quantity};
use range_integration_tests::{FakeApi, KETTLE_ID, MUG_ID, USER_EMAIL};
use range_storefront::StorefrontError;
use range_storefront::services::AuthState;

const GET_CART: &str = "GET /api/cart/";

fn line(method: &str, item_id: &str) -> String {
    format!("{method} /api/cart/items/{item_id}/")
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_load_cart_replaces_local_state() {
    let api = FakeApi::start().await;
    let storefront = api.logged_in_storefront().await;
    assert!(storefront.cart().cart().is_empty());

    let item_id = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 2);
    let cart = storefront.cart().load_cart().await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id.as_str(), item_id);
    assert_eq!(cart.unit_count(), 2);
    assert_eq!(cart.total.unwrap().to_string(), "900.00 ₴");
    assert_eq!(storefront.cart().cart(), cart);
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn test_zero_quantity_deletes_then_reloads() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    storefront.cart().load_cart().await.unwrap();
    api.clear_requests();

    let cart = storefront
        .cart()
        .update_item(&CartItemId::new(item_id.as_str()), 0)
        .await
        .unwrap();

    assert!(cart.is_empty());
    assert!(storefront.cart().cart().is_empty());
    assert_eq!(
        api.request_lines(),
        vec![line("DELETE", &item_id), GET_CART.to_string()]
    );
}

#[tokio::test]
async fn test_negative_quantity_deletes() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 3);
    let storefront = api.logged_in_storefront().await;

    storefront
        .cart()
        .update_item(&CartItemId::new(item_id.as_str()), -5)
        .await
        .unwrap();

    let requests = api.requests();
    assert_eq!(requests[0].line(), line("DELETE", &item_id));
    assert!(requests[0].body.is_none());
    assert!(api.server_cart(USER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_positive_quantity_patches_then_reloads() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;

    let cart = storefront
        .cart()
        .update_item(&CartItemId::new(item_id.as_str()), 3)
        .await
        .unwrap();

    assert_eq!(
        api.request_lines(),
        vec![line("PATCH", &item_id), GET_CART.to_string()]
    );
    assert_eq!(
        api.requests()[0].body,
        Some(serde_json::json!({"quantity": 3}))
    );
    assert_eq!(cart.items[0].quantity.get(), 3);
    assert_eq!(storefront.cart().cart().unit_count(), 3);
}

#[tokio::test]
async fn test_no_non_positive_quantity_is_ever_sent() {
    let api = FakeApi::start().await;
    let kettle = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 2);
    let mug = api.seed_cart_item(USER_EMAIL, MUG_ID, 2);
    let storefront = api.logged_in_storefront().await;

    for (item_id, quantity) in [(&kettle, 1), (&kettle, 0), (&mug, -1)] {
        storefront
            .cart()
            .update_item(&CartItemId::new(item_id.as_str()), quantity)
            .await
            .unwrap();
    }

    for request in api.requests() {
        if let Some(quantity) = request
            .body
            .as_ref()
            .and_then(|body| body.get("quantity"))
            .and_then(serde_json::Value::as_i64)
        {
            assert!(quantity > 0, "sent quantity {quantity}");
        }
    }
    assert!(api.server_cart(USER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_cart_and_skips_reload() {
    let api = FakeApi::start().await;
    api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    let before = storefront.cart().load_cart().await.unwrap();
    api.clear_requests();

    let err = storefront
        .cart()
        .update_item(&CartItemId::new("item-404"), 0)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), r#"{"detail":"Not found."}"#);
    assert_eq!(err.to_string(), r#"{"detail":"Not found."}"#);
    assert_eq!(storefront.cart().cart(), before);
    assert_eq!(api.request_lines(), vec![line("DELETE", "item-404")]);
}

#[tokio::test]
async fn test_remove_item_is_delete() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, MUG_ID, 4);
    let storefront = api.logged_in_storefront().await;

    let cart = storefront
        .cart()
        .remove_item(&CartItemId::new(item_id.as_str()))
        .await
        .unwrap();

    assert!(cart.item(&CartItemId::new(item_id.as_str())).is_none());
    assert_eq!(api.request_lines()[0], line("DELETE", &item_id));
}

// ============================================================================
// Adding
// ============================================================================

#[tokio::test]
async fn test_anonymous_add_requires_login_without_request() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();
    storefront.start().await;
    api.clear_requests();

    let err = storefront
        .cart()
        .add_item(&ProductId::new(KETTLE_ID), Quantity::ONE)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::LoginRequired {
            redirect_to: "/auth/login"
        }
    ));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_add_while_unknown_requires_login() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    let err = storefront
        .cart()
        .add_item(&ProductId::new(KETTLE_ID), Quantity::ONE)
        .await
        .unwrap_err();

    assert!(matches!(err, StorefrontError::LoginRequired { .. }));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_add_posts_then_reloads() {
    let api = FakeApi::start().await;
    let storefront = api.logged_in_storefront().await;

    let cart = storefront
        .cart()
        .add_item(&ProductId::new(MUG_ID), Quantity::new(2).unwrap())
        .await
        .unwrap();

    assert_eq!(
        api.request_lines(),
        vec!["POST /api/cart/items/".to_string(), GET_CART.to_string()]
    );
    assert_eq!(
        api.requests()[0].body,
        Some(serde_json::json!({"product_id": MUG_ID, "quantity": 2}))
    );
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_title, "Mug");
    assert_eq!(cart.unit_count(), 2);
}

#[tokio::test]
async fn test_rejected_add_keeps_cart() {
    let api = FakeApi::start().await;
    let storefront = api.logged_in_storefront().await;

    let err = storefront
        .cart()
        .add_item(&ProductId::new("p-missing"), Quantity::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), r#"{"product_id":["Product not found"]}"#);
    assert!(storefront.cart().cart().is_empty());
    assert_eq!(api.request_lines(), vec!["POST /api/cart/items/"]);
}

// ============================================================================
// Ordering and lifetime
// ============================================================================

#[tokio::test]
async fn test_concurrent_mutations_complete_in_call_order() {
    let api = FakeApi::start().await;
    let first = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let second = api.seed_cart_item(USER_EMAIL, MUG_ID, 1);
    let storefront = api.logged_in_storefront().await;

    // Slow down the first mutation so an unserialized second one would overtake it.
    api.delay(
        Method::PATCH,
        &format!("/api/cart/items/{first}/"),
        Duration::from_millis(100),
    );

    let cart = storefront.cart();
    let first_id = CartItemId::new(first.as_str());
    let second_id = CartItemId::new(second.as_str());
    let (a, b) = tokio::join!(
        cart.update_item(&first_id, 5),
        cart.update_item(&second_id, 0),
    );
    a.unwrap();
    let last = b.unwrap();

    assert_eq!(
        api.request_lines(),
        vec![
            line("PATCH", &first),
            GET_CART.to_string(),
            line("DELETE", &second),
            GET_CART.to_string(),
        ]
    );
    assert_eq!(storefront.cart().cart(), last);
    assert_eq!(last.unit_count(), 5);
}

#[tokio::test]
async fn test_close_drops_in_flight_reload() {
    let api = FakeApi::start().await;
    api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    api.delay(Method::GET, "/api/cart/", Duration::from_millis(200));

    let cart = storefront.cart().clone();
    let pending = tokio::spawn(async move { cart.load_cart().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    storefront.shutdown();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(StorefrontError::Closed)));
    assert!(storefront.cart().cart().is_empty());

    api.clear_requests();
    let err = storefront
        .cart()
        .update_item(&CartItemId::new("item-1"), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, StorefrontError::Closed));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_logout_clears_local_cart() {
    let api = FakeApi::start().await;
    api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    storefront.cart().load_cart().await.unwrap();
    assert!(!storefront.cart().cart().is_empty());

    storefront.logout();

    assert!(storefront.cart().cart().is_empty());
    assert_eq!(api.server_cart(USER_EMAIL).len(), 1);
}

#[tokio::test]
async fn test_logout_drops_in_flight_reload() {
    let api = FakeApi::start().await;
    api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    api.delay(Method::GET, "/api/cart/", Duration::from_millis(200));

    let cart = storefront.cart().clone();
    let pending = tokio::spawn(async move { cart.load_cart().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    storefront.logout();
    assert_eq!(storefront.auth().state(), AuthState::Anonymous);

    // The reload went out with the old token; its cart must not come back.
    let result = pending.await.unwrap().unwrap();
    assert!(result.is_empty());
    assert!(storefront.cart().cart().is_empty());
    assert_eq!(api.requests()[0].authorization.as_deref(), Some("Bearer T1"));
}

#[tokio::test]
async fn test_logout_drops_reload_after_in_flight_mutation() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, KETTLE_ID, 1);
    let storefront = api.logged_in_storefront().await;
    api.delay(Method::GET, "/api/cart/", Duration::from_millis(200));

    let cart = storefront.cart().clone();
    let id = CartItemId::new(item_id.as_str());
    let pending = tokio::spawn(async move { cart.update_item(&id, 4).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    storefront.logout();

    let result = pending.await.unwrap().unwrap();
    assert!(result.is_empty());
    assert!(storefront.cart().cart().is_empty());
    assert_eq!(
        api.request_lines(),
        vec![line("PATCH", &item_id), GET_CART.to_string()]
    );
    assert_eq!(api.server_cart(USER_EMAIL), vec![(item_id, 4)]);
}
