//! Cart snapshot types.
//!
//! A [`Cart`] is always a complete snapshot returned by the commerce platform.
//! Nothing here merges or patches carts; callers replace the whole value
//! after every mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, CartLineId, VariantId};
use super::price::{Price, PriceError};
use super::product::Image;

/// The purchasable variant a cart line refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title ("Default Title" for single-variant products).
    pub title: String,
    /// Parent product title.
    pub product_title: String,
    /// Parent product URL handle.
    pub product_handle: String,
    /// Unit price.
    pub price: Price,
    /// Variant image, if any.
    pub image: Option<Image>,
}

impl Merchandise {
    /// Variant title worth showing next to the product title.
    ///
    /// Single-variant products carry the platform placeholder "Default Title",
    /// which is never displayed.
    #[must_use]
    pub fn display_variant_title(&self) -> Option<&str> {
        if self.title.is_empty() || self.title == "Default Title" {
            None
        } else {
            Some(&self.title)
        }
    }
}

/// A single line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity; always at least 1 (zero-quantity lines are removed).
    pub quantity: u32,
    /// The variant being purchased.
    pub merchandise: Merchandise,
    /// Line total as computed by the platform.
    pub total: Price,
}

/// A cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// URL that hands the buyer off to the platform's checkout.
    pub checkout_url: String,
    /// Total item count as reported by the platform.
    pub total_quantity: u32,
    /// Estimated total cost as reported by the platform.
    pub estimated_total: Price,
    /// Lines in platform order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn line_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Display totals with a flat shipping charge added.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total is out of range.
    pub fn summary(&self, shipping: Decimal) -> Result<CartSummary, PriceError> {
        CartSummary::new(self, shipping)
    }
}

/// Totals shown on the cart page.
///
/// The subtotal is the platform's estimate; only the shipping surcharge is
/// added locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Sum of line quantities.
    pub total_quantity: u32,
    /// Platform-estimated cart total.
    pub subtotal: Price,
    /// Flat shipping charge.
    pub shipping: Price,
    /// Subtotal plus shipping.
    pub total: Price,
}

impl CartSummary {
    /// Build the summary for a cart snapshot.
    ///
    /// Shipping is charged in the cart's currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total is out of range.
    pub fn new(cart: &Cart, shipping: Decimal) -> Result<Self, PriceError> {
        let subtotal = cart.estimated_total;
        let shipping = Price::new(shipping, subtotal.currency_code);

        Ok(Self {
            total_quantity: cart.line_quantity(),
            subtotal,
            shipping,
            total: subtotal.checked_add(shipping)?,
        })
    }
}
