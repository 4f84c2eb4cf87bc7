//! Range REST API client.
//!
//! # Architecture
//!
//! - One `reqwest::Client`, shared by every service through [`ApiClient`]
//! - Credentials are read from the [`SessionStore`] on every call, so a
//!   login or logout takes effect on the next request without rebuilding
//!   anything
//! - The server is the source of truth - no retries, no timeouts, no token
//!   refresh: exactly one attempt per call
//!
//! # Example
//!
//! ```rust,ignore
//! use range_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api, session);
//!
//! // Raw JSON
//! let profile = client.call(Method::GET, "/api/users/profile/", CallOptions::default()).await?;
//!
//! // Typed
//! let cart: Cart = client.get("/api/cart/").await?;
//! ```

pub mod paths;
pub mod types;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::ApiConfig;
use crate::session::SessionStore;

/// Message used when a failed response carries no body.
pub const GENERIC_ERROR_MESSAGE: &str = "API error";

/// Maximum number of body characters copied into logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when calling the Range API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status. The message is the
    /// raw response body, suitable for showing to the user.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Raw response body, or a generic message when the body was empty.
        message: String,
    },

    /// A success response could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a `Status` error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

/// Per-call options.
#[derive(Debug, Default)]
pub struct CallOptions {
    /// JSON request body.
    pub body: Option<Value>,
    /// Extra headers; these replace a default header of the same name.
    pub headers: Vec<(&'static str, String)>,
}

impl CallOptions {
    /// Options carrying a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if `body` cannot be encoded as JSON.
    pub fn json(body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self {
            body: Some(serde_json::to_value(body)?),
            headers: Vec::new(),
        })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// HTTP client wrapper for the Range API.
///
/// Cheaply cloneable; all clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a new API client reading credentials from `session`.
    #[must_use]
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                session,
            }),
        }
    }

    /// The session store this client reads credentials from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// API origin used for every request.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Issue a single request and return the parsed JSON body.
    ///
    /// Always sends `Content-Type: application/json`. Sends
    /// `Authorization: Bearer <token>` when an access token is held and an
    /// empty `Authorization` value otherwise; authorization is enforced by
    /// the server. An empty success body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` if the request could not be sent
    /// - `ApiError::Status` for any non-2xx response
    /// - `ApiError::Parse` if a success body is not JSON
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{path}", self.inner.base_url);

        let authorization = match self.inner.session.access_token() {
            Some(token) => HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .unwrap_or_else(|_| {
                    warn!("Access token is not a valid header value, sending empty Authorization");
                    HeaderValue::from_static("")
                }),
            None => HeaderValue::from_static(""),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, authorization);

        for (name, value) in options.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = name, "Skipping invalid request header"),
            }
        }

        let mut request = self.inner.client.request(method, &url).headers(headers);

        if let Some(body) = options.body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        // Read the body as text first so failures can carry it verbatim
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %truncate(&response_text),
                "Range API returned non-success status"
            );
            let message = if response_text.trim().is_empty() {
                GENERIC_ERROR_MESSAGE.to_string()
            } else {
                response_text
            };
            return Err(ApiError::Status { status, message });
        }

        debug!(status = %status, bytes = response_text.len(), "Range API response");

        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_text).map_err(|e| {
            error!(
                error = %e,
                body = %truncate(&response_text),
                "Failed to parse Range API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// [`ApiClient::call`] with the body decoded into `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`]; a body that does not match `T` is `ApiError::Parse`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> Result<T, ApiError> {
        decode(self.call(method, path, options).await?)
    }

    /// GET `path` and decode the body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call_json(Method::GET, path, CallOptions::default()).await
    }

    /// POST `body` to `path` and decode the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        self.call_json(Method::POST, path, CallOptions::json(body)?).await
    }

    /// PATCH `body` to `path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn patch(&self, path: &str, body: &impl Serialize) -> Result<Value, ApiError> {
        self.call(Method::PATCH, path, CallOptions::json(body)?).await
    }

    /// DELETE `path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.call(Method::DELETE, path, CallOptions::default()).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_displays_raw_body() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: "{\"detail\":\"Not found.\"}".to_string(),
        };
        assert_eq!(err.to_string(), "{\"detail\":\"Not found.\"}");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: GENERIC_ERROR_MESSAGE.to_string(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_decode_null_into_option() {
        let decoded: Option<u32> = decode(Value::Null).ok().flatten();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_truncate_limits_log_body() {
        let long = "x".repeat(LOG_BODY_LIMIT * 2);
        assert_eq!(truncate(&long).len(), LOG_BODY_LIMIT);
    }
}
