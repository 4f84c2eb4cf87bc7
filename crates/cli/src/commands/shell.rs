//! Interactive storefront session.
//!
//! One shell is one session: the access token obtained by `login` lives
//! only as long as the shell. The refresh token and the username hint are
//! persisted in the state directory and outlive it.
//!
//! Each input line is split with shell quoting rules and parsed with clap,
//! so `help` and `<command> --help` work as usual.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use range_core::{CartItemId, Email, OrderId, ProductId, Quantity};
use range_storefront::api::types::CreateOrderRequest;
use range_storefront::services::ValidationError;
use range_storefront::{Storefront, StorefrontError};

use super::{CliError, catalog};
use crate::render;

const PROMPT: &str = "range> ";

#[derive(Parser)]
#[command(no_binary_name = true, name = "range shell")]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Log in for this session
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Log out and forget the stored tokens
    Logout,
    /// Show who is logged in
    Whoami,
    /// Show the cart
    Cart,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: String,
        /// Number of units
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Set the quantity of a cart line (0 or less removes it)
    Set {
        /// Cart line ID
        item_id: String,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        item_id: String,
    },
    /// Place an order for the whole cart
    Order {
        /// Shipping address
        shipping_address: String,
        /// Contact name
        #[arg(long)]
        name: Option<String>,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Contact phone
        #[arg(long)]
        phone: Option<String>,
    },
    /// List orders, or show one
    Orders {
        /// Order ID
        id: Option<String>,
    },
    /// List categories
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
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

enum Flow {
    Continue,
    Exit,
}

/// Run the shell until `exit` or end of input.
pub async fn run(storefront: &Storefront) -> Result<(), CliError> {
    let mut editor = DefaultEditor::new()?;

    let state = storefront.start().await;
    println!(
        "{}",
        render::auth_state(&state, storefront.auth().cached_username().as_deref())
    );
    println!("Type `help` for commands, `exit` to quit.");

    loop {
        let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                storefront.shutdown();
                return Err(e.into());
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let words = match shell_words::split(line) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("Parse error: {e}");
                continue;
            }
        };

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        match execute(storefront, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(StorefrontError::LoginRequired { .. }) => {
                eprintln!("Please log in first: login <email> <password>");
            }
            Err(e) => eprintln!("Error: {}", e.user_message()),
        }
    }

    storefront.shutdown();
    Ok(())
}

async fn execute(storefront: &Storefront, command: ShellCommand) -> Result<Flow, StorefrontError> {
    match command {
        ShellCommand::Login { email, password } => {
            let state = storefront.auth().login(&email, &password).await?;
            println!("{}", render::auth_state(&state, None));
            if state.is_authenticated() {
                storefront.cart().load_cart().await?;
            }
        }
        ShellCommand::Logout => {
            storefront.logout();
            println!("Logged out.");
        }
        ShellCommand::Whoami => {
            let state = storefront.auth().load_profile().await;
            println!(
                "{}",
                render::auth_state(&state, storefront.auth().cached_username().as_deref())
            );
        }
        ShellCommand::Cart => {
            let cart = storefront.cart().load_cart().await?;
            println!("{}", render::cart(&cart));
        }
        ShellCommand::Add {
            product_id,
            quantity,
        } => {
            let quantity = Quantity::new(quantity).unwrap_or(Quantity::ONE);
            let cart = storefront
                .cart()
                .add_item(&ProductId::new(product_id), quantity)
                .await?;
            println!("{}", render::cart(&cart));
        }
        ShellCommand::Set { item_id, quantity } => {
            let cart = storefront
                .cart()
                .update_item(&CartItemId::new(item_id), quantity)
                .await?;
            println!("{}", render::cart(&cart));
        }
        ShellCommand::Remove { item_id } => {
            let cart = storefront
                .cart()
                .remove_item(&CartItemId::new(item_id))
                .await?;
            println!("{}", render::cart(&cart));
        }
        ShellCommand::Order {
            shipping_address,
            name,
            email,
            phone,
        } => {
            let contact_email = email
                .map(|raw| Email::parse(&raw))
                .transpose()
                .map_err(ValidationError::from)?;
            let order = storefront
                .orders()
                .submit(CreateOrderRequest {
                    shipping_address,
                    contact_name: name,
                    contact_email,
                    contact_phone: phone,
                })
                .await?;
            println!("{}", render::order(&order));
        }
        ShellCommand::Orders { id: None } => {
            let orders = storefront.orders().list_orders().await?;
            println!("{}", render::orders(&orders));
        }
        ShellCommand::Orders { id: Some(id) } => {
            let order = storefront.orders().get_order(&OrderId::new(id)).await?;
            println!("{}", render::order(&order));
        }
        ShellCommand::Categories => catalog::categories(storefront).await?,
        ShellCommand::Category { id } => catalog::category(storefront, &id).await?,
        ShellCommand::Product { id } => catalog::product(storefront, &id).await?,
        ShellCommand::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellCommand {
        ShellLine::try_parse_from(shell_words::split(line).unwrap())
            .unwrap()
            .command
    }

    #[test]
    fn test_set_accepts_negative_quantity() {
        assert!(matches!(
            parse("set item-1 -1"),
            ShellCommand::Set { ref item_id, quantity: -1 } if item_id == "item-1"
        ));
    }

    #[test]
    fn test_order_address_keeps_quotes() {
        match parse(r#"order "Kyiv, Khreshchatyk 1" --phone 0501234567"#) {
            ShellCommand::Order {
                shipping_address,
                phone,
                name,
                ..
            } => {
                assert_eq!(shipping_address, "Kyiv, Khreshchatyk 1");
                assert_eq!(phone.as_deref(), Some("0501234567"));
                assert!(name.is_none());
            }
            _ => panic!("expected order"),
        }
    }

    #[test]
    fn test_add_defaults_to_one_unit() {
        assert!(matches!(parse("add p1"), ShellCommand::Add { quantity: 1, .. }));
    }

    #[test]
    fn test_quit_is_exit() {
        assert!(matches!(parse("quit"), ShellCommand::Exit));
    }
}
