//! Auth session manager.
//!
//! Owns the `Unknown -> Authenticated | Anonymous` state machine. Only a
//! successful profile load moves the session to `Authenticated`; tokens and
//! the cached username are never treated as proof.
//!
//! State is published on a `tokio::sync::watch` channel. Dependants call
//! [`AuthSession::subscribe`] and re-derive from the latest value instead
//! of keeping their own copy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use range_core::{AccessToken, Email, RefreshToken};

use super::validation::{RegistrationForm, validate_login};
use crate::api::types::{LoginRequest, LoginResponse, Profile, RegisterRequest};
use crate::api::{ApiClient, paths};
use crate::error::{Result, clear_sentry_user, set_sentry_user};

/// Name sent at registration when the form leaves it out.
pub const PLACEHOLDER_NAME: &str = "Place";

/// The authenticated user, as reported by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: Email,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

impl From<Profile> for User {
    fn from(profile: Profile) -> Self {
        Self {
            email: profile.email,
            username: profile.username,
            first_name: profile.first_name,
            last_name: profile.last_name,
        }
    }
}

/// Authentication state of this storefront instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No profile load has completed yet.
    #[default]
    Unknown,
    /// The last profile load succeeded.
    Authenticated(User),
    /// The last profile load failed, or the user logged out.
    Anonymous,
}

impl AuthState {
    /// Whether the state is `Authenticated`.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

// =============================================================================
// AuthSession
// =============================================================================

/// Auth session manager.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

struct AuthSessionInner {
    api: ApiClient,
    state: watch::Sender<AuthState>,
    /// Bumped whenever credentials change; a profile load that started
    /// under an older generation does not publish its result.
    generation: AtomicU64,
    /// Held while credentials are stored or cleared together with a
    /// generation bump.
    credentials: Mutex<()>,
}

impl AuthSession {
    /// Create a manager in the `Unknown` state.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(AuthSessionInner {
                api,
                state: watch::Sender::new(AuthState::Unknown),
                generation: AtomicU64::new(0),
                credentials: Mutex::new(()),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Whether the state is `Authenticated`.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    /// Username cached from an earlier login or registration.
    ///
    /// Display hint only; says nothing about whether the session is valid.
    #[must_use]
    pub fn cached_username(&self) -> Option<String> {
        self.inner.api.session().username()
    }

    /// Ask the server who the current credentials belong to.
    ///
    /// Success moves the state to `Authenticated`. Any failure, including
    /// a network error, moves it to `Anonymous`; the error is logged and
    /// not returned. If credentials change while the request is in flight
    /// its result is discarded and the newer state is returned.
    #[instrument(skip(self))]
    pub async fn load_profile(&self) -> AuthState {
        let started = self.inner.generation.load(Ordering::SeqCst);

        let next = match self.inner.api.get::<Profile>(paths::PROFILE).await {
            Ok(profile) => AuthState::Authenticated(User::from(profile)),
            Err(e) => {
                debug!(error = %e, "Profile load failed, session is anonymous");
                AuthState::Anonymous
            }
        };

        // Compare under the channel's write lock so a logout cannot slip in
        // between the check and the publish.
        let mut current = false;
        self.inner.state.send_if_modified(|state| {
            current = self.inner.generation.load(Ordering::SeqCst) == started;
            if !current || *state == next {
                return false;
            }
            *state = next.clone();
            true
        });

        if !current {
            debug!("Credentials changed during profile load, discarding result");
            return self.state();
        }

        match &next {
            AuthState::Authenticated(user) => set_sentry_user(user.email.as_str()),
            _ => clear_sentry_user(),
        }
        next
    }

    /// Log in with email and password.
    ///
    /// On success the token pair is stored and the profile is loaded; the
    /// returned state is whatever that load produced. On failure the
    /// session and state are left as they were. If the session is logged
    /// out while the request is in flight, the issued tokens are dropped
    /// and the current state is returned.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Validation` for a malformed email or empty password
    /// - `StorefrontError::Api` with the server's message if login is refused
    /// - `StorefrontError::Storage` if the refresh token cannot be persisted
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState> {
        let email = validate_login(email, password)?;
        let started = self.inner.generation.load(Ordering::SeqCst);

        let tokens: LoginResponse = self
            .inner
            .api
            .post(
                paths::LOGIN,
                &LoginRequest {
                    email: email.as_str(),
                    password,
                },
            )
            .await?;

        let session = self.inner.api.session();
        {
            let _credentials = self.lock_credentials();
            if self.inner.generation.load(Ordering::SeqCst) != started {
                info!("Logged out during login, discarding issued tokens");
                return Ok(self.state());
            }

            let previous_access = session.access_token();
            if let Err(e) = session.store_login(
                AccessToken::new(tokens.access),
                RefreshToken::new(tokens.refresh),
            ) {
                match previous_access {
                    Some(token) => session.set_access_token(token),
                    None => session.clear_access_token(),
                }
                return Err(e.into());
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }

        if let Err(e) = session.set_username(email.as_str()) {
            warn!(error = %e, "Failed to cache username");
        }

        let state = self.load_profile().await;
        info!(authenticated = state.is_authenticated(), "Login completed");
        Ok(state)
    }

    /// Log out locally.
    ///
    /// Clears both tokens and moves to `Anonymous`. No network call;
    /// calling it again is a no-op.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        {
            let _credentials = self.lock_credentials();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            self.inner.api.session().clear_credentials();
        }
        clear_sentry_user();

        self.inner.state.send_if_modified(|state| {
            if *state == AuthState::Anonymous {
                false
            } else {
                *state = AuthState::Anonymous;
                true
            }
        });
    }

    /// Create an account.
    ///
    /// Does not log in. The email doubles as the username and is cached as
    /// the display hint.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Validation` if the form fails client-side checks
    /// - `StorefrontError::Api` with the server's message if registration is refused
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        let email = form.validate()?;

        let body = RegisterRequest {
            email: email.as_str(),
            username: email.as_str(),
            first_name: non_blank(form.first_name.as_deref()),
            last_name: non_blank(form.last_name.as_deref()),
            password: &form.password,
            password_confirm: &form.password_confirm,
        };
        self.inner.api.post::<serde_json::Value>(paths::REGISTER, &body).await?;

        if let Err(e) = self.inner.api.session().set_username(email.as_str()) {
            warn!(error = %e, "Failed to cache username");
        }

        info!("Account registered");
        Ok(())
    }
}

impl AuthSession {
    fn lock_credentials(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn non_blank(name: Option<&str>) -> &str {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(PLACEHOLDER_NAME)
}
