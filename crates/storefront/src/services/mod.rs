//! Storefront services.
//!
//! # Services
//!
//! - `auth` - Session state machine (login, logout, profile, registration)
//! - `cart` - Server-owned cart with reload-after-mutation
//! - `orders` - Checkout from cart and order history
//! - `catalog` - Cached category and product reads
//! - `validation` - Client-side form checks

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod validation;

pub use auth::{AuthSession, AuthState, User};
pub use cart::CartController;
pub use catalog::Catalog;
pub use orders::OrderService;
pub use validation::{RegistrationForm, ValidationError};
