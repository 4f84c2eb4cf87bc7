//! Integration tests for the HTTP client wrapper.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use range_core::AccessToken;
use range_integration_tests::{FakeApi, USER_EMAIL, USER_PASSWORD};
use range_storefront::StorefrontConfig;
use range_storefront::api::types::Page;
use range_storefront::api::{ApiClient, ApiError, CallOptions, GENERIC_ERROR_MESSAGE};
use range_storefront::session::SessionStore;

const CATEGORIES: &str = "/api/catalog/categories/";

// ============================================================================
// Headers
// ============================================================================

#[tokio::test]
async fn test_anonymous_request_sends_json_and_empty_authorization() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    storefront
        .api()
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(requests[0].authorization.as_deref(), Some(""));
}

#[tokio::test]
async fn test_bearer_token_is_sent_after_login() {
    let api = FakeApi::start().await;
    let storefront = api.logged_in_storefront().await;

    storefront.cart().load_cart().await.unwrap();

    let requests = api.requests();
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer T1"));
}

#[tokio::test]
async fn test_token_unfit_for_header_sends_empty_authorization() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();
    storefront
        .session()
        .set_access_token(AccessToken::new("broken\ntoken"));

    storefront
        .api()
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap();

    assert_eq!(api.requests()[0].authorization.as_deref(), Some(""));
}

#[tokio::test]
async fn test_extra_headers_are_applied() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    let options = CallOptions {
        body: None,
        headers: vec![("authorization", "Bearer custom".to_string())],
    };
    storefront
        .api()
        .call(Method::GET, CATEGORIES, options)
        .await
        .unwrap();

    assert_eq!(
        api.requests()[0].authorization.as_deref(),
        Some("Bearer custom")
    );
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    let body = serde_json::json!({"email": USER_EMAIL, "password": USER_PASSWORD});
    let response = storefront
        .api()
        .call(
            Method::POST,
            "/api/users/login/",
            CallOptions::json(&body).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response["access"], "T1");
    assert_eq!(api.requests()[0].body.as_ref(), Some(&body));
}

// ============================================================================
// Responses
// ============================================================================

#[tokio::test]
async fn test_typed_call_decodes_page() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    let page: Page<Value> = storefront
        .api()
        .call_json(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap();

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.count, Some(1));
}

#[tokio::test]
async fn test_error_message_is_raw_body() {
    let api = FakeApi::start().await;
    let storefront = api.storefront();

    let err = storefront
        .api()
        .call(
            Method::GET,
            "/api/catalog/products/missing/",
            CallOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.to_string(), r#"{"detail":"Not found."}"#);
}

#[tokio::test]
async fn test_empty_error_body_uses_generic_message() {
    let api = FakeApi::start().await;
    api.fail_next(Method::GET, CATEGORIES, StatusCode::BAD_GATEWAY, "");
    let storefront = api.storefront();

    let err = storefront
        .api()
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Status { status: StatusCode::BAD_GATEWAY, ref message } if message == GENERIC_ERROR_MESSAGE
    ));
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let api = FakeApi::start().await;
    let item_id = api.seed_cart_item(USER_EMAIL, "p-kettle", 1);
    let storefront = api.logged_in_storefront().await;

    let response = storefront
        .api()
        .delete(&format!("/api/cart/items/{item_id}/"))
        .await
        .unwrap();

    assert_eq!(response, Value::Null);
}

#[tokio::test]
async fn test_non_json_success_body_is_parse_error() {
    let api = FakeApi::start().await;
    api.fail_next(Method::GET, CATEGORIES, StatusCode::OK, "<html>maintenance</html>");
    let storefront = api.storefront();

    let err = storefront
        .api()
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind then drop a listener so the port is very likely closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = StorefrontConfig::new(&format!("http://{addr}")).unwrap();
    let client = ApiClient::new(&config.api, Arc::new(SessionStore::in_memory()));

    let err = client
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_exactly_one_attempt_per_call() {
    let api = FakeApi::start().await;
    api.fail_next(Method::GET, CATEGORIES, StatusCode::SERVICE_UNAVAILABLE, "busy");
    let storefront = api.storefront();

    let result = storefront
        .api()
        .call(Method::GET, CATEGORIES, CallOptions::default())
        .await;

    assert!(result.is_err());
    assert_eq!(api.request_lines(), vec![format!("GET {CATEGORIES}")]);
}
