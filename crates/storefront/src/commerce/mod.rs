//! Commerce platform boundary.
//!
//! # Architecture
//!
//! - The platform is reached through its backend routes (JSON over HTTP)
//! - The platform is source of truth - NO local cart state, direct API calls
//! - Catalog reads are cached in memory via `moka` (5 minute TTL)
//! - Every response envelope is validated into a [`Reply`] before use
//!
//! # Operations
//!
//! | Operation | Route |
//! |---|---|
//! | create cart | `POST /api/cart/create` |
//! | get cart | `POST /api/cart/get` |
//! | add line | `POST /api/cart/add` |
//! | update lines | `POST /api/cart/update` |
//! | remove lines | `POST /api/cart/remove` |
//! | list products | `GET /api/inventory` |
//! | get product | `GET /api/product/{handle}` |
//!
//! # Example
//!
//! ```rust,ignore
//! use meeple_storefront::commerce::{CommerceApi, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce);
//!
//! let cart = client.create_cart().await?;
//! client.add_line(&cart.id, &variant_id, 2).await?;
//! let cart = client.get_cart(&cart.id).await?;
//! ```

mod cache;
mod client;
mod conversions;
mod wire;

use std::future::Future;

pub use client::CommerceClient;

use meeple_core::{Cart, CartId, CartLineId, PriceError, Product, VariantId};
use thiserror::Error;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with a body that is not a response envelope.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The envelope claimed success but its payload was unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A price in the payload could not be parsed.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A request URL could not be built from the configured base URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl CommerceError {
    /// Whether the failure happened below the envelope (no usable answer).
    ///
    /// Views show a generic connection message for these instead of the
    /// backend's own error text.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Parse(_) | Self::RateLimited(_)
        )
    }
}

/// A validated response envelope.
///
/// The backend answers `{ success, ...payload, error? }`. Callers only ever
/// see one of these two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// `success: true` with its payload.
    Success(T),
    /// `success: false`, with the backend's message when it sent one.
    Failure {
        /// Error message from the backend.
        error: Option<String>,
    },
}

impl<T> Reply<T> {
    /// Turn a failure into [`CommerceError::Rejected`], using `fallback` when
    /// the backend sent no message.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Rejected` for `Reply::Failure`.
    pub fn into_result(self, fallback: &str) -> Result<T, CommerceError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure { error } => Err(CommerceError::Rejected(
                error.unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }
}

/// New quantity for one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineUpdate {
    /// Line to change.
    pub id: CartLineId,
    /// New quantity (at least 1; removal goes through `remove_lines`).
    pub quantity: u32,
}

/// The seven operations the storefront needs from the commerce platform.
///
/// Implemented over HTTP by [`CommerceClient`]; tests substitute an
/// in-memory fake.
pub trait CommerceApi: Send + Sync {
    /// Create an empty cart.
    fn create_cart(&self) -> impl Future<Output = Result<Cart, CommerceError>> + Send;

    /// Fetch a cart by ID. `Ok(None)` means the platform no longer knows it.
    fn get_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, CommerceError>> + Send;

    /// Add a variant to a cart. The platform returns no snapshot for this call.
    fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    /// Change line quantities, returning the new snapshot.
    fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineUpdate],
    ) -> impl Future<Output = Result<Cart, CommerceError>> + Send;

    /// Remove lines, returning the new snapshot.
    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> impl Future<Output = Result<Cart, CommerceError>> + Send;

    /// Fetch the full product collection.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CommerceError>> + Send;

    /// Fetch one product by URL handle.
    fn get_product(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Product, CommerceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("catan".to_string());
        assert_eq!(err.to_string(), "Not found: catan");

        let err = CommerceError::Status {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 502: Bad Gateway");
    }

    #[test]
    fn test_transport_classification() {
        assert!(CommerceError::RateLimited(3).is_transport());
        assert!(
            CommerceError::Status {
                status: 500,
                body: String::new()
            }
            .is_transport()
        );
        assert!(!CommerceError::Rejected("sold out".to_string()).is_transport());
        assert!(!CommerceError::NotFound("x".to_string()).is_transport());
    }

    #[test]
    fn test_reply_into_result_uses_backend_message() {
        let reply: Reply<()> = Reply::Failure {
            error: Some("Store is closed".to_string()),
        };
        let err = reply.into_result("Failed to load products").unwrap_err();
        assert_eq!(err.to_string(), "Rejected: Store is closed");
    }

    #[test]
    fn test_reply_into_result_falls_back() {
        let reply: Reply<()> = Reply::Failure { error: None };
        let err = reply.into_result("Failed to load products").unwrap_err();
        assert_eq!(err.to_string(), "Rejected: Failed to load products");

        assert_eq!(Reply::Success(7).into_result("unused").ok(), Some(7));
    }
}
