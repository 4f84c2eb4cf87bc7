//! Range CLI - browse the catalog, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! range categories
//! range category <category-id>
//! range product <product-id>
//!
//! # Create an account
//! range register -e a@b.com -p 12345678 -c 12345678
//!
//! # Interactive session: login, cart, checkout
//! range shell
//! ```
//!
//! # Environment Variables
//!
//! See `range_storefront::config` (`RANGE_API_BASE_URL`, `RANGE_STATE_DIR`,
//! `RANGE_CATALOG_CACHE_TTL_SECS`, `SENTRY_DSN`, `SENTRY_ENVIRONMENT`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use range_storefront::services::RegistrationForm;
use range_storefront::{Storefront, StorefrontConfig};

mod commands;
mod render;

use commands::CliError;

#[derive(Parser)]
#[command(name = "range")]
#[command(author, version, about = "Range storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog categories
    Categories,
    /// Show a category and its products
    Category {
        /// Category ID
        id: String,
    },
    /// Show a product
    Product {
        /// Product ID
        id: String,
    },
    /// Create an account (does not log in)
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password, at least 8 characters
        #[arg(short, long, env = "RANGE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password again
        #[arg(short = 'c', long)]
        password_confirm: String,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Start an interactive session
    Shell,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{}", CliError::from(e));
            }
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so they do not interleave with command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "range_storefront=info,range_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storefront = Storefront::new(config);

    if let Err(e) = run(cli, &storefront).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), CliError> {
    match cli.command {
        Commands::Categories => commands::catalog::categories(storefront).await?,
        Commands::Category { id } => commands::catalog::category(storefront, &id).await?,
        Commands::Product { id } => commands::catalog::product(storefront, &id).await?,
        Commands::Register {
            email,
            password,
            password_confirm,
            first_name,
            last_name,
        } => {
            let form = RegistrationForm {
                email,
                password,
                password_confirm,
                first_name,
                last_name,
            };
            commands::account::register(storefront, form).await?;
        }
        Commands::Shell => commands::shell::run(storefront).await?,
    }
    Ok(())
}
