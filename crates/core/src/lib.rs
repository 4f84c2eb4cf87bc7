//! Range Core - Shared types library.
//!
//! This crate provides common types used across all Range storefront components:
//! - `storefront` - Client library for the Range catalog/cart/order API
//! - `cli` - Terminal front end built on the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, quantities,
//!   emails, credentials, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
