//! Integration tests for the Range storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p range-integration-tests
//! ```
//!
//! No external services are needed. [`FakeApi`] serves the Range REST
//! endpoints from memory on an ephemeral local port and records every
//! request it receives, so tests can assert both on client state and on
//! exactly what went over the wire.
//!
//! # Fixtures
//!
//! - User `a@b.com` / `12345678` (see [`USER_EMAIL`], [`USER_PASSWORD`])
//! - Category `cat-kitchen` with products `p-kettle` (450.00) and `p-mug` (120.00)
//! - Logins issue tokens `T1`/`R1`, `T2`/`R2`, ... in order
//! - Cart lines are numbered `item-1`, `item-2`, ... in creation order

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use range_storefront::{Storefront, StorefrontConfig};

pub const USER_EMAIL: &str = "a@b.com";
pub const USER_PASSWORD: &str = "12345678";
pub const CATEGORY_ID: &str = "cat-kitchen";
pub const KETTLE_ID: &str = "p-kettle";
pub const MUG_ID: &str = "p-mug";

// =============================================================================
// Recorded traffic
// =============================================================================

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// `"METHOD /path"`, handy for asserting on sequences.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

// =============================================================================
// Fake state
// =============================================================================

#[derive(Debug, Clone)]
struct FakeProduct {
    id: &'static str,
    title: &'static str,
    price_minor: i64,
}

static PRODUCTS: [FakeProduct; 2] = [
    FakeProduct {
        id: KETTLE_ID,
        title: "Kettle",
        price_minor: 45_000,
    },
    FakeProduct {
        id: MUG_ID,
        title: "Mug",
        price_minor: 12_000,
    },
];

#[derive(Debug, Clone)]
struct FakeCartItem {
    id: String,
    product_id: String,
    quantity: i64,
}

#[derive(Debug, Clone)]
struct FakeUser {
    password: String,
    username: String,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    method: Method,
    path: String,
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct FakeState {
    users: HashMap<String, FakeUser>,
    /// Access token to user email.
    sessions: HashMap<String, String>,
    logins: u32,
    carts: HashMap<String, Vec<FakeCartItem>>,
    next_item: u32,
    orders: Vec<(String, Value)>,
    next_order: u32,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<InjectedFailure>,
    delays: HashMap<(Method, String), Duration>,
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// FakeApi
// =============================================================================

/// In-process fake of the Range REST API.
///
/// The server task is aborted when the value is dropped.
pub struct FakeApi {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeApi {
    /// Start a server on an ephemeral port with the default fixtures.
    pub async fn start() -> Self {
        let mut state = FakeState::default();
        state.users.insert(
            USER_EMAIL.to_string(),
            FakeUser {
                password: USER_PASSWORD.to_string(),
                username: USER_EMAIL.to_string(),
            },
        );
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake API address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Origin of the fake API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this server, session in memory.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(&self.base_url()).expect("Fake API URL is valid")
    }

    /// A fresh storefront (one "tab") with in-memory session state.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::new(self.config())
    }

    /// A fresh storefront persisting its session under `dir`.
    #[must_use]
    pub fn storefront_in(&self, dir: &Path) -> Storefront {
        Storefront::new(self.config().with_state_dir(dir))
    }

    /// A storefront that is already logged in as the fixture user.
    pub async fn logged_in_storefront(&self) -> Storefront {
        let storefront = self.storefront();
        let state = storefront
            .auth()
            .login(USER_EMAIL, USER_PASSWORD)
            .await
            .expect("Fixture login succeeds");
        assert!(state.is_authenticated());
        self.clear_requests();
        storefront
    }

    // =========================================================================
    // Traffic
    // =========================================================================

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Request lines (`"METHOD /path"`) received so far.
    #[must_use]
    pub fn request_lines(&self) -> Vec<String> {
        lock(&self.state)
            .requests
            .iter()
            .map(RecordedRequest::line)
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    // =========================================================================
    // Behaviour control
    // =========================================================================

    /// Answer the next `method path` request with `status` and `body`.
    pub fn fail_next(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        lock(&self.state).failures.push_back(InjectedFailure {
            method,
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
    }

    /// Hold every `method path` response for `delay`.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        lock(&self.state)
            .delays
            .insert((method, path.to_string()), delay);
    }

    /// Register another account.
    pub fn add_user(&self, email: &str, password: &str) {
        lock(&self.state).users.insert(
            email.to_string(),
            FakeUser {
                password: password.to_string(),
                username: email.to_string(),
            },
        );
    }

    /// Whether an account exists for `email`.
    #[must_use]
    pub fn has_user(&self, email: &str) -> bool {
        lock(&self.state).users.contains_key(email)
    }

    /// Put a line directly into a user's cart, returning its ID.
    pub fn seed_cart_item(&self, email: &str, product_id: &str, quantity: i64) -> String {
        let mut state = lock(&self.state);
        state.next_item += 1;
        let id = format!("item-{}", state.next_item);
        state
            .carts
            .entry(email.to_string())
            .or_default()
            .push(FakeCartItem {
                id: id.clone(),
                product_id: product_id.to_string(),
                quantity,
            });
        id
    }

    /// `(item id, quantity)` for each line of a user's server-side cart.
    #[must_use]
    pub fn server_cart(&self, email: &str) -> Vec<(String, i64)> {
        lock(&self.state)
            .carts
            .get(email)
            .map(|items| {
                items
                    .iter()
                    .map(|item| (item.id.clone(), item.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of orders placed so far.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Request handling
// =============================================================================

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header_value = |name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<Value>(&body).ok()
    };

    let request = RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    };

    let delay = {
        let mut guard = lock(&state);
        guard.requests.push(request.clone());
        guard.delays.get(&(method.clone(), path.clone())).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut guard = lock(&state);
    if let Some(index) = guard
        .failures
        .iter()
        .position(|f| f.method == method && f.path == path)
    {
        if let Some(failure) = guard.failures.remove(index) {
            return (failure.status, failure.body).into_response();
        }
    }

    route(&mut guard, &request)
}

fn route(state: &mut FakeState, request: &RecordedRequest) -> Response {
    let user = request
        .authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| state.sessions.get(token))
        .cloned();

    let segments: Vec<&str> = request
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["api", "catalog", "categories"]) => ok(json!({
            "count": 1,
            "results": [category_json(false)]
        })),
        ("GET", ["api", "catalog", "categories", id]) if *id == CATEGORY_ID => {
            ok(category_json(true))
        }
        ("GET", ["api", "catalog", "products", id]) => {
            match PRODUCTS.iter().find(|p| p.id == *id) {
                Some(product) => ok(product_json(product)),
                None => not_found(),
            }
        }
        ("POST", ["api", "users", "login"]) => login(state, request.body.as_ref()),
        ("POST", ["api", "users", "register"]) => register(state, request.body.as_ref()),
        ("GET", ["api", "users", "profile"]) => match user {
            Some(email) => ok(profile_json(state, &email)),
            None => unauthorized(),
        },
        ("GET", ["api", "cart"]) => ok(cart_json(state, user.as_deref())),
        (_, ["api", "cart", ..]) if user.is_none() => unauthorized(),
        ("POST", ["api", "cart", "items"]) => {
            add_cart_item(state, user.as_deref().unwrap_or_default(), request.body.as_ref())
        }
        ("PATCH", ["api", "cart", "items", id]) => {
            update_cart_item(state, user.as_deref().unwrap_or_default(), id, request.body.as_ref())
        }
        ("DELETE", ["api", "cart", "items", id]) => {
            delete_cart_item(state, user.as_deref().unwrap_or_default(), id)
        }
        ("POST", ["api", "orders", "create-from-cart"]) => {
            create_order(state, user.as_deref(), request.body.as_ref())
        }
        (_, ["api", "orders", ..]) if user.is_none() => unauthorized(),
        ("GET", ["api", "orders"]) => {
            let email = user.unwrap_or_default();
            let results: Vec<Value> = state
                .orders
                .iter()
                .rev()
                .filter(|(owner, _)| *owner == email)
                .map(|(_, order)| order.clone())
                .collect();
            ok(json!({"count": results.len(), "results": results}))
        }
        ("GET", ["api", "orders", id]) => {
            let email = user.unwrap_or_default();
            state
                .orders
                .iter()
                .find(|(owner, order)| *owner == email && order["id"] == *id)
                .map_or_else(not_found, |(_, order)| ok(order.clone()))
        }
        _ => not_found(),
    }
}

fn login(state: &mut FakeState, body: Option<&Value>) -> Response {
    let email = field(body, "email");
    let password = field(body, "password");

    let valid = state
        .users
        .get(&email)
        .is_some_and(|user| user.password == password);
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Invalid credentials"}"#,
        )
            .into_response();
    }

    state.logins += 1;
    let access = format!("T{}", state.logins);
    let refresh = format!("R{}", state.logins);
    state.sessions.insert(access.clone(), email);
    ok(json!({"access": access, "refresh": refresh}))
}

fn register(state: &mut FakeState, body: Option<&Value>) -> Response {
    let email = field(body, "email");
    let password = field(body, "password");

    if state.users.contains_key(&email) {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"email":["User with same  email already exists."]}"#,
        )
            .into_response();
    }
    if password.chars().count() < 8 || password != field(body, "password_confirm") {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"password_confirm":"Passwords do not match."}"#,
        )
            .into_response();
    }

    let username = field(body, "username");
    state.users.insert(
        email.clone(),
        FakeUser {
            password,
            username: username.clone(),
        },
    );
    (
        StatusCode::CREATED,
        axum::Json(json!({
            "user": {"email": email, "username": username},
            "message": "User registered successfully"
        })),
    )
        .into_response()
}

fn add_cart_item(state: &mut FakeState, email: &str, body: Option<&Value>) -> Response {
    let product_id = field(body, "product_id");
    let quantity = body
        .and_then(|b| b.get("quantity"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if quantity < 1 {
        return bad_request(r#"{"quantity":["Ensure this value is greater than or equal to 1."]}"#);
    }
    if !PRODUCTS.iter().any(|p| p.id == product_id) {
        return bad_request(r#"{"product_id":["Product not found"]}"#);
    }

    state.next_item += 1;
    let next_id = format!("item-{}", state.next_item);
    let items = state.carts.entry(email.to_string()).or_default();
    if let Some(existing) = items.iter_mut().find(|i| i.product_id == product_id) {
        existing.quantity += quantity;
    } else {
        items.push(FakeCartItem {
            id: next_id,
            product_id,
            quantity,
        });
    }

    (StatusCode::CREATED, axum::Json(json!({"status": "added"}))).into_response()
}

fn update_cart_item(state: &mut FakeState, email: &str, id: &str, body: Option<&Value>) -> Response {
    let quantity = body
        .and_then(|b| b.get("quantity"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if quantity < 1 {
        return bad_request(r#"{"quantity":["Ensure this value is greater than or equal to 1."]}"#);
    }

    let items = state.carts.entry(email.to_string()).or_default();
    match items.iter_mut().find(|i| i.id == id) {
        Some(item) => {
            item.quantity = quantity;
            ok(json!({"id": id, "quantity": quantity}))
        }
        None => not_found(),
    }
}

fn delete_cart_item(state: &mut FakeState, email: &str, id: &str) -> Response {
    let items = state.carts.entry(email.to_string()).or_default();
    let before = items.len();
    items.retain(|i| i.id != id);
    if items.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn create_order(state: &mut FakeState, user: Option<&str>, body: Option<&Value>) -> Response {
    let shipping_address = field(body, "shipping_address");
    if shipping_address.trim().is_empty() {
        return bad_request(r#"{"shipping_address":["This field may not be blank."]}"#);
    }
    let Some(email) = user else {
        return bad_request(r#"{"detail":"no cart"}"#);
    };

    let items = state.carts.remove(email).unwrap_or_default();
    if items.is_empty() {
        return bad_request(r#"{"detail":"cart not found or empty"}"#);
    }

    let mut total = 0;
    let lines: Vec<Value> = items
        .iter()
        .map(|item| {
            let price = product_price(&item.product_id);
            total += price * item.quantity;
            json!({
                "product_id": item.product_id,
                "product_title": product_title(&item.product_id),
                "quantity": item.quantity,
                "unit_price": money(price),
                "subtotal": money(price * item.quantity),
            })
        })
        .collect();

    state.next_order += 1;
    let order = json!({
        "id": format!("order-{}", state.next_order),
        "status": "pending",
        "total_amount": money(total),
        "total": money(total),
        "shipping_address": shipping_address,
        "contact_name": body.and_then(|b| b.get("contact_name")).cloned(),
        "contact_email": body.and_then(|b| b.get("contact_email")).cloned(),
        "contact_phone": body.and_then(|b| b.get("contact_phone")).cloned(),
        "items": lines,
        "created_at": "2025-11-02T10:00:00Z",
    });
    state.orders.push((email.to_string(), order.clone()));

    (StatusCode::CREATED, axum::Json(order)).into_response()
}

// =============================================================================
// JSON builders
// =============================================================================

fn category_json(with_products: bool) -> Value {
    let mut category = json!({
        "id": CATEGORY_ID,
        "title": "Kitchen",
        "description": "Things for the kitchen",
        "image_url": null,
        "products_count": PRODUCTS.len(),
        "created_at": "2025-01-01T00:00:00Z",
    });
    if with_products {
        category["products"] = PRODUCTS.iter().map(product_json).collect();
    }
    category
}

fn product_json(product: &FakeProduct) -> Value {
    json!({
        "id": product.id,
        "title": product.title,
        "description": "",
        "brand": "Range",
        "price": money(product.price_minor),
        "stock_quantity": 10,
        "in_stock": true,
        "rating": "4.50",
        "category_id": CATEGORY_ID,
        "category_title": "Kitchen",
    })
}

fn profile_json(state: &FakeState, email: &str) -> Value {
    let username = state
        .users
        .get(email)
        .map(|u| u.username.clone())
        .unwrap_or_default();
    json!({
        "id": 1,
        "email": email,
        "username": username,
        "first_name": "Place",
        "last_name": "Place",
        "is_active": true,
    })
}

fn cart_json(state: &FakeState, user: Option<&str>) -> Value {
    let items = user
        .and_then(|email| state.carts.get(email))
        .cloned()
        .unwrap_or_default();

    let mut total = 0;
    let lines: Vec<Value> = items
        .iter()
        .map(|item| {
            let price = product_price(&item.product_id);
            total += price * item.quantity;
            json!({
                "id": item.id,
                "product_id": item.product_id,
                "product_title": product_title(&item.product_id),
                "quantity": item.quantity,
                "unit_price": money(price),
                "added_at": "2025-11-02T10:00:00Z",
            })
        })
        .collect();

    json!({"id": "cart-1", "items": lines, "total": money(total)})
}

fn product_price(id: &str) -> i64 {
    PRODUCTS
        .iter()
        .find(|p| p.id == id)
        .map_or(0, |p| p.price_minor)
}

fn product_title(id: &str) -> &'static str {
    PRODUCTS
        .iter()
        .find(|p| p.id == id)
        .map_or("Unknown", |p| p.title)
}

fn money(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}

fn field(body: Option<&Value>, name: &str) -> String {
    body.and_then(|b| b.get(name))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn ok(body: Value) -> Response {
    (StatusCode::OK, axum::Json(body)).into_response()
}

fn bad_request(body: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, body).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        r#"{"detail":"Authentication credentials were not provided."}"#,
    )
        .into_response()
}
