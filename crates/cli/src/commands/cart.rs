//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! meeple cart add catan --quantity 2
//! meeple cart show
//! meeple cart set <line-id> 3
//! meeple cart remove <line-id>
//! meeple cart checkout
//! ```
//!
//! The cart ID is read from (and, when a cart is created, written to) the
//! `--cart-file`.

use meeple_core::{Cart, CartLineId};
use meeple_storefront::cart::{CartError, CartPhase};
use meeple_storefront::commerce::{CommerceApi, CommerceError};
use rust_decimal::Decimal;
use thiserror::Error;

use super::Context;

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Fetching the product failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// The cart could not be loaded or created.
    #[error("Cart unavailable: {0}")]
    Unavailable(String),

    /// Nothing to check out.
    #[error("Your cart is empty")]
    EmptyCart,
}

/// Print the cart, creating one if this cart file has none.
///
/// # Errors
///
/// Returns `CartCommandError::Unavailable` if the cart cannot be loaded.
pub async fn show(ctx: &Context) -> Result<(), CartCommandError> {
    let mut session = ctx.cart_session();

    match session.initialize().await {
        CartPhase::Ready(cart) => {
            print_cart(cart, ctx.store.standard_shipping);
            Ok(())
        }
        CartPhase::Failed(message) => Err(CartCommandError::Unavailable(message.clone())),
        phase => Err(CartCommandError::Unavailable(format!("{phase:?}"))),
    }
}

/// Add a game by handle; the quantity is clamped to stock.
///
/// # Errors
///
/// Returns the product lookup or cart error.
pub async fn add(ctx: &Context, handle: &str, quantity: u32) -> Result<(), CartCommandError> {
    let product = ctx.commerce.get_product(handle).await?;
    let mut session = ctx.cart_session();

    let cart = session.add_product(&product, quantity).await?;
    tracing::info!(cart_id = %cart.id, handle, "Added to cart");

    print_cart(&cart, ctx.store.standard_shipping);
    Ok(())
}

/// Set a line's quantity; 0 removes the line.
///
/// # Errors
///
/// Returns `CartError::NoCart` if this cart file has no cart, or the
/// backend error.
pub async fn set(ctx: &Context, line_id: &str, quantity: u32) -> Result<(), CartCommandError> {
    let mut session = ctx.cart_session();

    let cart = session
        .set_line_quantity(&CartLineId::new(line_id), quantity)
        .await?;

    print_cart(&cart, ctx.store.standard_shipping);
    Ok(())
}

/// Print the checkout URL for a non-empty cart.
///
/// # Errors
///
/// Returns `CartCommandError::EmptyCart` if there is nothing to buy.
#[allow(clippy::print_stdout)]
pub async fn checkout(ctx: &Context) -> Result<(), CartCommandError> {
    let mut session = ctx.cart_session();
    session.resync().await?;

    let url = session
        .checkout()
        .filter(|_| session.cart().is_some_and(|cart| !cart.is_empty()))
        .ok_or(CartCommandError::EmptyCart)?;

    println!("{url}");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart, shipping: Decimal) {
    for line in render_cart(cart, shipping) {
        println!("{line}");
    }
}

/// Text lines for a cart snapshot.
fn render_cart(cart: &Cart, shipping: Decimal) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Your cart is empty.".to_string()];
    }

    let mut out: Vec<String> = cart
        .lines
        .iter()
        .map(|line| {
            let name = line.merchandise.display_variant_title().map_or_else(
                || line.merchandise.product_title.clone(),
                |variant| format!("{} ({variant})", line.merchandise.product_title),
            );
            format!(
                "{:<40} x{:<3} {:>10}  [{}]",
                name, line.quantity, line.total.to_string(), line.id
            )
        })
        .collect();

    let Ok(summary) = cart.summary(shipping) else {
        out.push("Total:     unavailable".to_string());
        return out;
    };
    out.push(String::new());
    out.push(format!("Items:     {}", summary.total_quantity));
    out.push(format!("Subtotal:  {}", summary.subtotal));
    out.push(format!("Shipping:  {}", summary.shipping));
    out.push(format!("Total:     {}", summary.total));
    out
}
