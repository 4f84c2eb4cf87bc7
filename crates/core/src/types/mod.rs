//! Core types for the Range storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod status;

pub use credential::{AccessToken, RefreshToken};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use quantity::Quantity;
pub use status::*;
