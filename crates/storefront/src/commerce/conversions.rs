//! Conversion from backend JSON shapes to domain types.

use meeple_core::{
    Cart, CartId, CartLine, CartLineId, Image, Merchandise, Price, Product, ProductId, VariantId,
};
use tracing::warn;

use super::CommerceError;
use super::wire::{WireCart, WireCartLine, WireImage, WireMoney, WireProduct};

// =============================================================================
// Cart
// =============================================================================

/// Convert a cart snapshot.
///
/// Zero-quantity lines are dropped; negative quantities are rejected.
pub fn convert_cart(cart: WireCart) -> Result<Cart, CommerceError> {
    let total_quantity = u32::try_from(cart.total_quantity).map_err(|_| {
        CommerceError::InvalidResponse(format!(
            "cart {} has total quantity {}",
            cart.id, cart.total_quantity
        ))
    })?;

    let mut lines = Vec::with_capacity(cart.lines.edges.len());
    for edge in cart.lines.edges {
        if let Some(line) = convert_cart_line(&cart.id, edge.node)? {
            lines.push(line);
        }
    }

    Ok(Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity,
        estimated_total: convert_money(&cart.estimated_cost.total_amount)?,
        lines,
    })
}

fn convert_cart_line(cart_id: &str, line: WireCartLine) -> Result<Option<CartLine>, CommerceError> {
    if line.quantity == 0 {
        warn!(cart_id = %cart_id, line_id = %line.id, "Dropping zero-quantity cart line");
        return Ok(None);
    }

    let quantity = u32::try_from(line.quantity).map_err(|_| {
        CommerceError::InvalidResponse(format!(
            "line {} has quantity {}",
            line.id, line.quantity
        ))
    })?;

    let merchandise = line.merchandise;
    let product_title = merchandise.product.title;

    Ok(Some(CartLine {
        id: CartLineId::new(line.id),
        quantity,
        merchandise: Merchandise {
            id: VariantId::new(merchandise.id),
            title: merchandise.title,
            price: convert_money(&merchandise.price)?,
            image: merchandise.image.map(|image| Image {
                url: image.url,
                alt: image
                    .alt_text
                    .filter(|alt| !alt.is_empty())
                    .unwrap_or_else(|| product_title.clone()),
            }),
            product_title,
            product_handle: merchandise.product.handle,
        },
        total: convert_money(&line.estimated_cost.total_amount)?,
    }))
}

fn convert_money(money: &WireMoney) -> Result<Price, CommerceError> {
    Ok(Price::parse(&money.amount, &money.currency_code)?)
}

// =============================================================================
// Product
// =============================================================================

/// Convert a product projection.
///
/// Negative stock counts (oversold inventory) are reported as zero.
pub fn convert_product(product: WireProduct) -> Result<Product, CommerceError> {
    let price = Price::parse(&product.price, &product.currency)?;
    let quantity = u32::try_from(product.quantity.max(0)).unwrap_or(u32::MAX);
    let title = product.title;

    let convert_image = |image: WireImage| Image {
        url: image.url,
        alt: image
            .alt
            .filter(|alt| !alt.is_empty())
            .unwrap_or_else(|| title.clone()),
    };

    let featured_image = product.featured_image.map(convert_image);
    let images = product.images.into_iter().map(convert_image).collect();

    Ok(Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        description_html: product.description,
        price,
        in_stock: product.in_stock,
        quantity,
        variant_id: product
            .variant_id
            .filter(|id| !id.is_empty())
            .map(VariantId::new),
        featured_image,
        images,
        title,
    })
}

/// Convert a product list, skipping entries that fail to convert.
pub fn convert_products(products: Vec<WireProduct>) -> Vec<Product> {
    products
        .into_iter()
        .filter_map(|product| {
            let handle = product.handle.clone();
            match convert_product(product) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Skipping product with invalid data");
                    None
                }
            }
        })
        .collect()
}
