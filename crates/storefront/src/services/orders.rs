//! Order submission and history.
//!
//! Checkout is one atomic create-from-cart call; the server builds the
//! order from the cart and empties it. The cart is then reloaded so the
//! local snapshot follows.

use tracing::{info, instrument, warn};

use range_core::OrderId;

use super::cart::CartController;
use super::validation::validate_shipping_address;
use crate::api::types::{CreateOrderRequest, Listing, Order};
use crate::api::{ApiClient, paths};
use crate::error::{Result, add_breadcrumb};

/// Order service.
#[derive(Clone)]
pub struct OrderService {
    api: ApiClient,
    cart: CartController,
}

impl OrderService {
    /// Create an order service that reloads `cart` after checkout.
    #[must_use]
    pub const fn new(api: ApiClient, cart: CartController) -> Self {
        Self { api, cart }
    }

    /// Place an order for the current cart, shipped to `shipping_address`.
    ///
    /// # Errors
    ///
    /// See [`OrderService::submit`].
    pub async fn create_order(&self, shipping_address: &str) -> Result<OrderId> {
        let order = self
            .submit(CreateOrderRequest {
                shipping_address: shipping_address.to_string(),
                ..Default::default()
            })
            .await?;
        Ok(order.id)
    }

    /// Place an order for the current cart.
    ///
    /// On success the cart is reloaded. A failed reload is logged and does
    /// not fail the order, which the server has already accepted. On
    /// failure the cart is left alone and nothing is retried.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Validation` if the shipping address is blank
    /// - `StorefrontError::Api` with the server's message if the order is refused
    /// - `StorefrontError::Closed` if the cart controller is closed
    #[instrument(skip(self, request))]
    pub async fn submit(&self, mut request: CreateOrderRequest) -> Result<Order> {
        request.shipping_address = validate_shipping_address(&request.shipping_address)?;

        let _guard = self.cart.lock().await;
        self.cart.ensure_open()?;
        add_breadcrumb("checkout", "Submitted order", None);

        let order: Order = self
            .api
            .post(paths::CREATE_ORDER_FROM_CART, &request)
            .await?;
        info!(order_id = %order.id, "Order created");

        if let Err(e) = self.cart.reload_locked().await {
            warn!(order_id = %order.id, error = %e, "Cart reload after order failed");
        }

        Ok(order)
    }

    /// Orders placed by the current user, newest first as the server sends them.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self.api.get(paths::ORDERS).await?;
        Ok(listing.into_items())
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the request fails or the order is
    /// not visible to the current user.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        Ok(self.api.get(&paths::order(id)).await?)
    }
}
