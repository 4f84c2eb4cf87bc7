//! Client-side form checks.
//!
//! These run before any request is built; a failure here never reaches the
//! network. The server repeats its own validation and its messages are
//! surfaced verbatim through `ApiError`.

use thiserror::Error;

use range_core::{Email, EmailError};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Input rejected on the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Email is missing or malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password field left empty.
    #[error("password is required")]
    EmptyPassword,

    /// Password shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },

    /// Password confirmation differs from the password.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Shipping address is blank.
    #[error("shipping address is required")]
    EmptyShippingAddress,
}

/// Check login input, returning the parsed email.
///
/// # Errors
///
/// Returns `ValidationError` for a malformed email or an empty password.
pub fn validate_login(email: &str, password: &str) -> Result<Email, ValidationError> {
    let email = Email::parse(email.trim())?;
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(email)
}

/// Registration form as entered by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegistrationForm {
    /// Check the form, returning the parsed email.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: email, password length, confirmation.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        let email = Email::parse(self.email.trim())?;

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if self.password != self.password_confirm {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(email)
    }
}

/// Check a shipping address, returning it trimmed.
///
/// # Errors
///
/// Returns `ValidationError::EmptyShippingAddress` for blank input.
pub fn validate_shipping_address(address: &str) -> Result<String, ValidationError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyShippingAddress);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_registration_accepts_valid_form() {
        let email = form(" a@b.com ", "12345678", "12345678").validate().unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[test]
    fn test_registration_rejects_short_password() {
        assert_eq!(
            form("a@b.com", "1234567", "1234567").validate(),
            Err(ValidationError::PasswordTooShort { min: 8 })
        );
    }

    #[test]
    fn test_registration_rejects_mismatch() {
        assert_eq!(
            form("a@b.com", "12345678", "12345679").validate(),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_registration_rejects_bad_email_first() {
        assert!(matches!(
            form("not-an-email", "1", "2").validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_login_requires_password() {
        assert_eq!(
            validate_login("a@b.com", ""),
            Err(ValidationError::EmptyPassword)
        );
        assert!(validate_login("a@b.com", "x").is_ok());
    }

    #[test]
    fn test_shipping_address_is_trimmed() {
        assert_eq!(validate_shipping_address("  Lviv  ").unwrap(), "Lviv");
        assert_eq!(
            validate_shipping_address(" \t"),
            Err(ValidationError::EmptyShippingAddress)
        );
    }
}
