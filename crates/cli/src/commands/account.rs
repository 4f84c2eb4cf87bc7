//! Account registration.
//!
//! # Usage
//!
//! ```bash
//! range register -e a@b.com -p 12345678 -c 12345678
//! ```
//!
//! Registration does not log in; start `range shell` and `login` afterwards.

#![allow(clippy::print_stdout)]

use range_storefront::Storefront;
use range_storefront::services::RegistrationForm;

use super::CliError;

/// Register a new account.
pub async fn register(storefront: &Storefront, form: RegistrationForm) -> Result<(), CliError> {
    storefront.auth().register(&form).await?;
    println!(
        "Account created for {}. Run `range shell` and log in.",
        form.email.trim()
    );
    Ok(())
}
