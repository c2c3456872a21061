//! JSON shapes exchanged with the commerce backend.
//!
//! Field names follow the backend (camelCase). Nothing outside this module
//! and `conversions` sees these types.

use serde::{Deserialize, Serialize};

use super::Reply;

// =============================================================================
// Envelope
// =============================================================================

/// `{ success, ...payload, error? }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn into_reply(self) -> Reply<T> {
        if self.success {
            Reply::Success(self.payload)
        } else {
            Reply::Failure { error: self.error }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub cart: Option<WireCart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductsPayload {
    #[serde(default)]
    pub products: Option<Vec<WireProduct>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    #[serde(default)]
    pub product: Option<WireProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoPayload {}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CreateCartRequest {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCartRequest<'a> {
    pub cart_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest<'a> {
    pub cart_id: &'a str,
    pub variant_id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinesRequest<'a> {
    pub cart_id: &'a str,
    pub lines: Vec<LineQuantity<'a>>,
}

#[derive(Debug, Serialize)]
pub struct LineQuantity<'a> {
    pub id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLinesRequest<'a> {
    pub cart_id: &'a str,
    pub line_ids: Vec<&'a str>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCart {
    pub id: String,
    #[serde(default)]
    pub checkout_url: String,
    #[serde(default)]
    pub total_quantity: i64,
    pub estimated_cost: WireCost,
    #[serde(default)]
    pub lines: Connection<WireCartLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCost {
    pub total_amount: WireMoney,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMoney {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default)]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartLine {
    pub id: String,
    pub quantity: i64,
    pub merchandise: WireMerchandise,
    pub estimated_cost: WireCost,
}

#[derive(Debug, Deserialize)]
pub struct WireMerchandise {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub product: WireProductRef,
    pub price: WireMoney,
    #[serde(default)]
    pub image: Option<WireCartImage>,
}

#[derive(Debug, Deserialize)]
pub struct WireProductRef {
    pub title: String,
    pub handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartImage {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub featured_image: Option<WireImage>,
    #[serde(default)]
    pub images: Vec<WireImage>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}
