//! Storefront composition root.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::services::{AuthSession, AuthState, CartController, Catalog, OrderService};
use crate::session::SessionStore;

/// One storefront session: the equivalent of a browser tab.
///
/// Owns the access token for its lifetime and shares the persisted refresh
/// token and username with every other instance using the same state
/// directory. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    session: Arc<SessionStore>,
    api: ApiClient,
    auth: AuthSession,
    cart: CartController,
    orders: OrderService,
    catalog: Catalog,
}

impl Storefront {
    /// Wire up every service for `config`.
    ///
    /// Opens the durable session file when a state directory is configured.
    /// The auth state starts as `Unknown`; call [`Storefront::start`] to
    /// resolve it.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let session = Arc::new(SessionStore::open(config.state_dir.as_deref()));
        let api = ApiClient::new(&config.api, Arc::clone(&session));
        let auth = AuthSession::new(api.clone());
        let cart = CartController::new(api.clone(), auth.clone());
        let orders = OrderService::new(api.clone(), cart.clone());
        let catalog = Catalog::new(api.clone(), config.catalog_cache_ttl);

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                session,
                api,
                auth,
                cart,
                orders,
                catalog,
            }),
        }
    }

    /// Resolve the initial auth state with a profile load.
    pub async fn start(&self) -> AuthState {
        self.inner.auth.load_profile().await
    }

    /// Log out and forget the local cart snapshot.
    pub fn logout(&self) {
        self.inner.auth.logout();
        self.inner.cart.reset();
    }

    /// Close the cart controller; results still in flight are dropped.
    pub fn shutdown(&self) {
        self.inner.cart.close();
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the Range API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the auth session manager.
    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.inner.auth
    }

    /// Get a reference to the cart controller.
    #[must_use]
    pub fn cart(&self) -> &CartController {
        &self.inner.cart
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
