//! Unified error handling with Sentry integration.
//!
//! Every storefront operation returns `Result<T, StorefrontError>`. The
//! variants follow the client's error taxonomy: network failures and
//! non-success API responses come from [`ApiError`], client-side checks
//! from [`ValidationError`]; the rest are session-level conditions.

use thiserror::Error;

use crate::api::ApiError;
use crate::services::validation::ValidationError;
use crate::session::StorageError;

/// Path front ends redirect to when an action needs a logged-in user.
pub const LOGIN_PATH: &str = "/auth/login";

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Range API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before reaching the network.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persisted session could not be written.
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The action needs an authenticated user; no request was made.
    #[error("Login required")]
    LoginRequired {
        /// Where the front end should send the user.
        redirect_to: &'static str,
    },

    /// The owning component was shut down.
    #[error("Storefront session closed")]
    Closed,
}

impl StorefrontError {
    /// The login redirect error.
    #[must_use]
    pub const fn login_required() -> Self {
        Self::LoginRequired {
            redirect_to: LOGIN_PATH,
        }
    }

    /// Text to show the user for this error.
    ///
    /// For a non-success API response this is the raw response body.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Status { message, .. }) => message.clone(),
            Self::Api(ApiError::Network(_)) => {
                "Could not reach the store. Check your connection and try again.".to_string()
            }
            Self::Api(ApiError::Parse(_)) => "The store sent an unexpected response.".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
            Self::LoginRequired { .. } => "Please log in to continue.".to_string(),
            Self::Closed => "This session has ended.".to_string(),
        }
    }

    /// Whether the error came from the server rather than the client.
    #[must_use]
    pub const fn is_api_error(&self) -> bool {
        matches!(self, Self::Api(_))
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context.
///
/// Call this after a successful profile load to associate errors with users.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Updated quantity", Some(&[("item_id", "item-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
