//! Read-only product projection.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};
use super::price::Price;

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt: String,
}

/// A product as exposed by the commerce platform.
///
/// The listing endpoint omits the description, variant and image gallery;
/// those fields are empty / `None` for listing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// URL handle.
    pub handle: String,
    /// Description HTML. Trusted: authored in the platform admin.
    pub description_html: String,
    /// Price of the purchasable variant.
    pub price: Price,
    /// Whether the product can be bought right now.
    pub in_stock: bool,
    /// Quantity available for sale.
    pub quantity: u32,
    /// The purchasable variant (one per product in this store).
    pub variant_id: Option<VariantId>,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// All images in gallery order.
    pub images: Vec<Image>,
}

impl Product {
    /// Whether an add-to-cart is possible at all.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.in_stock && self.variant_id.is_some()
    }

    /// The image to lead with: the featured image, else the first gallery image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.featured_image.as_ref().or_else(|| self.images.first())
    }
}
