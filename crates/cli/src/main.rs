//! Meeple CLI - browse games and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List games, most expensive first
//! meeple products --sort price --desc
//!
//! # Show one game
//! meeple product catan
//!
//! # Manage the cart (ID kept in .meeple-cart)
//! meeple cart add catan --quantity 2
//! meeple cart show
//! meeple cart set <line-id> 3
//! meeple cart remove <line-id>
//! meeple cart checkout
//! ```
//!
//! # Environment Variables
//!
//! - `COMMERCE_API_URL` - Commerce backend base URL (required)
//! - `COMMERCE_API_TOKEN` - Bearer token for the backend (optional)
//! - `STANDARD_SHIPPING` - Flat shipping charge shown in cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use meeple_core::SortKey;

mod commands;
mod store;

#[derive(Parser)]
#[command(name = "meeple")]
#[command(author, version, about = "Meeple & Co. storefront from the terminal")]
struct Cli {
    /// File holding the cart ID between invocations
    #[arg(long, global = true, default_value = ".meeple-cart")]
    cart_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all games
    Products {
        /// Sort field
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,

        /// Sort in descending order
        #[arg(long)]
        desc: bool,
    },
    /// Show one game
    Product {
        /// Product handle (URL slug)
        handle: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart, creating one if needed
    Show,
    /// Add a game to the cart
    Add {
        /// Product handle (URL slug)
        handle: String,

        /// Quantity to add (clamped to stock)
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Cart line ID (see `cart show`)
        line_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Cart line ID (see `cart show`)
        line_id: String,
    },
    /// Print the checkout URL
    Checkout,
}

/// Listing sort field.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Price,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Price => Self::Price,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::from_env(cli.cart_file)?;

    match cli.command {
        Commands::Products { sort, desc } => {
            commands::catalog::list(&ctx, sort.into(), desc).await?;
        }
        Commands::Product { handle } => commands::catalog::show(&ctx, &handle).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { handle, quantity } => {
                commands::cart::add(&ctx, &handle, quantity).await?;
            }
            CartAction::Set { line_id, quantity } => {
                commands::cart::set(&ctx, &line_id, quantity).await?;
            }
            CartAction::Remove { line_id } => commands::cart::set(&ctx, &line_id, 0).await?,
            CartAction::Checkout => commands::cart::checkout(&ctx).await?,
        },
    }
    Ok(())
}
