//! CLI commands.

pub mod account;
pub mod catalog;
pub mod shell;

use thiserror::Error;

use range_storefront::StorefrontError;
use range_storefront::config::ConfigError;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A storefront operation failed.
    #[error("{}", .0.user_message())]
    Storefront(#[from] StorefrontError),

    /// The terminal could not be read.
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
