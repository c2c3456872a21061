//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! meeple products --sort price --desc
//! meeple product catan
//! ```

use meeple_core::{Product, SortKey, SortOrder, sort_products};
use meeple_storefront::commerce::{CommerceApi, CommerceError};

use super::Context;

/// Print every game, sorted.
///
/// # Errors
///
/// Returns `CommerceError` if the listing cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &Context, sort: SortKey, desc: bool) -> Result<(), CommerceError> {
    let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
    let products = ctx.commerce.list_products().await?;
    tracing::debug!(count = products.len(), "Fetched product listing");

    if products.is_empty() {
        println!("No games available right now.");
        return Ok(());
    }

    for product in sort_products(&products, sort, order) {
        println!("{}", listing_row(&product));
    }
    Ok(())
}

/// Print one game's details.
///
/// # Errors
///
/// Returns `CommerceError::NotFound` for an unknown handle, or the transport
/// error.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &Context, handle: &str) -> Result<(), CommerceError> {
    let product = ctx.commerce.get_product(handle).await?;

    println!("{}", product.title);
    println!("  handle:  {}", product.handle);
    println!("  price:   {}", product.price);
    println!("  stock:   {}", stock_label(&product));
    println!("  images:  {}", product.images.len());
    if !product.description_html.is_empty() {
        println!();
        println!("{}", product.description_html);
    }
    Ok(())
}

fn listing_row(product: &Product) -> String {
    format!(
        "{:<40} {:>10}  {:<14} {}",
        product.title,
        product.price.to_string(),
        stock_label(product),
        product.handle
    )
}

fn stock_label(product: &Product) -> String {
    if product.is_purchasable() && product.quantity > 0 {
        format!("{} in stock", product.quantity)
    } else {
        "out of stock".to_string()
    }
}
