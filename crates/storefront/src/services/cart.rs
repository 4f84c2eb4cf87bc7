//! Cart controller.
//!
//! The server owns the cart. Every successful mutation is followed by a
//! full reload, and the local snapshot is only ever replaced wholesale with
//! what that reload returned.
//!
//! Mutations and reloads go through one FIFO lock, so they complete in the
//! order they were called. After [`CartController::close`] results still in
//! flight are dropped and further calls fail with `StorefrontError::Closed`.
//! A reset (logout) likewise drops reloads that started before it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use range_core::{CartItemId, ProductId, Quantity};

use super::auth::AuthSession;
use crate::api::types::{AddCartItemRequest, Cart, UpdateCartItemRequest};
use crate::api::{ApiClient, paths};
use crate::error::{Result, StorefrontError, add_breadcrumb};

/// Cart controller.
///
/// Cheaply cloneable; clones share the snapshot, the lock and the closed flag.
#[derive(Clone)]
pub struct CartController {
    inner: Arc<CartControllerInner>,
}

struct CartControllerInner {
    api: ApiClient,
    auth: AuthSession,
    snapshot: RwLock<Cart>,
    /// Serializes mutate-then-reload pairs and standalone reloads.
    op_lock: Mutex<()>,
    closed: AtomicBool,
    /// Bumped by `reset`, only while the snapshot write lock is held.
    epoch: AtomicU64,
}

impl CartController {
    /// Create a controller with an empty snapshot.
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthSession) -> Self {
        Self {
            inner: Arc::new(CartControllerInner {
                api,
                auth,
                snapshot: RwLock::new(Cart::default()),
                op_lock: Mutex::new(()),
                closed: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Last cart fetched from the server.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop accepting calls and drop results still in flight.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("Cart controller closed");
        }
    }

    /// Whether [`CartController::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Fetch the cart and replace the snapshot with it.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Api` if the fetch fails; the snapshot is kept
    /// - `StorefrontError::Closed` if the controller is closed
    #[instrument(skip(self))]
    pub async fn load_cart(&self) -> Result<Cart> {
        self.ensure_open()?;
        let _guard = self.inner.op_lock.lock().await;
        self.reload_locked().await
    }

    /// Set the quantity of a cart line.
    ///
    /// Zero or a negative quantity deletes the line; anything else is sent
    /// as-is. On success the cart is reloaded and returned. On failure
    /// nothing is reloaded and the snapshot is unchanged.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Api` with the server's message if the mutation
    ///   or the reload fails
    /// - `StorefrontError::Closed` if the controller is closed
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_item(&self, item_id: &CartItemId, quantity: i64) -> Result<Cart> {
        self.ensure_open()?;
        let _guard = self.inner.op_lock.lock().await;
        self.ensure_open()?;

        let path = paths::cart_item(item_id);
        match Quantity::from_requested(quantity) {
            None => {
                add_breadcrumb("cart", "Removed item", Some(&[("item_id", item_id.as_str())]));
                self.inner.api.delete(&path).await?;
            }
            Some(quantity) => {
                let count = quantity.to_string();
                add_breadcrumb(
                    "cart",
                    "Updated quantity",
                    Some(&[("item_id", item_id.as_str()), ("quantity", count.as_str())]),
                );
                self.inner
                    .api
                    .patch(&path, &UpdateCartItemRequest { quantity })
                    .await?;
            }
        }

        self.reload_locked().await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// See [`CartController::update_item`].
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart> {
        self.update_item(item_id, 0).await
    }

    /// Add a product to the cart.
    ///
    /// Needs an authenticated session; otherwise fails without touching the
    /// network so the front end can send the user to the login page.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::LoginRequired` if the session is not `Authenticated`
    /// - `StorefrontError::Api` with the server's message if the add or the
    ///   reload fails
    /// - `StorefrontError::Closed` if the controller is closed
    #[instrument(skip(self), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: Quantity) -> Result<Cart> {
        self.ensure_open()?;
        if !self.inner.auth.is_authenticated() {
            info!("Add to cart needs login");
            return Err(StorefrontError::login_required());
        }

        let _guard = self.inner.op_lock.lock().await;
        self.ensure_open()?;

        let count = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product_id.as_str()), ("quantity", count.as_str())]),
        );
        self.inner
            .api
            .post::<serde_json::Value>(
                paths::CART_ITEMS,
                &AddCartItemRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;

        self.reload_locked().await
    }

    /// Forget the local snapshot without asking the server.
    ///
    /// Reloads already in flight will not write their result.
    pub(crate) fn reset(&self) {
        let mut snapshot = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        *snapshot = Cart::default();
    }

    /// Reload the cart while holding the op lock.
    ///
    /// If the snapshot was reset while the request was in flight the result
    /// belongs to the previous session; it is dropped and the current
    /// (empty) snapshot is returned instead.
    pub(crate) async fn reload_locked(&self) -> Result<Cart> {
        self.ensure_open()?;
        let started = self.inner.epoch.load(Ordering::SeqCst);
        let cart: Cart = self.inner.api.get(paths::CART).await?;
        self.ensure_open()?;

        let mut snapshot = self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.epoch.load(Ordering::SeqCst) != started {
            debug!("Cart reset during reload, discarding result");
            return Ok(snapshot.clone());
        }

        debug!(lines = cart.items.len(), "Cart reloaded");
        *snapshot = cart.clone();
        Ok(cart)
    }

    /// Take the op lock, for callers that mutate the cart through another endpoint.
    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.inner.op_lock.lock().await
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StorefrontError::Closed);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use crate::session::SessionStore;

    fn controller() -> CartController {
        // Unroutable port; these tests never reach the network.
        let config = StorefrontConfig::new("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(&config.api, Arc::new(SessionStore::in_memory()));
        let auth = AuthSession::new(api.clone());
        CartController::new(api, auth)
    }

    #[tokio::test]
    async fn test_add_item_requires_login() {
        let cart = controller();
        let err = cart
            .add_item(&ProductId::new("p1"), Quantity::ONE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::LoginRequired { redirect_to: "/auth/login" }
        ));
    }

    #[tokio::test]
    async fn test_closed_controller_rejects_calls() {
        let cart = controller();
        cart.close();
        cart.close();
        assert!(cart.is_closed());
        assert!(matches!(cart.load_cart().await, Err(StorefrontError::Closed)));
        assert!(matches!(
            cart.update_item(&CartItemId::new("item-1"), 2).await,
            Err(StorefrontError::Closed)
        ));
    }

    #[test]
    fn test_reset_empties_snapshot_and_advances_epoch() {
        let cart = controller();
        assert!(cart.cart().is_empty());
        cart.reset();
        cart.reset();
        assert_eq!(cart.cart(), Cart::default());
        assert_eq!(cart.inner.epoch.load(Ordering::SeqCst), 2);
    }
}
