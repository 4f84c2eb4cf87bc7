//! Range storefront client library.
//!
//! Session, auth, cart, checkout and catalog logic for the Range REST API,
//! independent of any particular front end.
//!
//! ```rust,ignore
//! use range_storefront::{Storefront, StorefrontConfig};
//!
//! let storefront = Storefront::new(StorefrontConfig::from_env()?);
//! storefront.start().await;
//! storefront.auth().login("a@b.com", "12345678").await?;
//! let cart = storefront.cart().load_cart().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;

pub use config::StorefrontConfig;
pub use error::{Result, StorefrontError};
pub use state::Storefront;
