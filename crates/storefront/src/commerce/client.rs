//! HTTP client for the commerce backend routes.
//!
//! Uses `reqwest` 0.13 with JSON bodies. Caches the product collection and
//! individual products using `moka` (5-minute TTL). Carts are never cached.

use std::sync::Arc;
use std::time::Duration;

use meeple_core::{Cart, CartId, CartLineId, Product, VariantId};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::CommerceConfig;

use super::cache::{CacheKey, CacheValue};
use super::conversions::{convert_cart, convert_product, convert_products};
use super::wire::{
    AddLineRequest, CartPayload, CreateCartRequest, Envelope, GetCartRequest, LineQuantity,
    NoPayload, ProductPayload, ProductsPayload, RemoveLinesRequest, UpdateLinesRequest, WireCart,
};
use super::{CommerceApi, CommerceError, LineUpdate, Reply};

/// Longest slice of an unparseable body kept for diagnostics.
const MAX_LOGGED_BODY: usize = 500;

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce backend routes.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CommerceClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                api_token: config.api_token.clone(),
                cache,
            }),
        }
    }

    /// Build an endpoint URL under the configured base.
    ///
    /// Segments are percent-encoded, so a handle can never escape its slot.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CommerceError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CommerceError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and validate the response envelope.
    ///
    /// The envelope is parsed regardless of status, because the backend
    /// reports `success: false` with 4xx/5xx codes too.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Reply<T>, CommerceError> {
        let request = match &self.inner.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope.into_reply()),
            Err(e) if status.is_success() => {
                error!(
                    error = %e,
                    body = %truncate(&body),
                    "Failed to parse commerce response"
                );
                Err(CommerceError::Parse(e))
            }
            Err(_) => {
                error!(
                    status = %status,
                    body = %truncate(&body),
                    "Commerce backend returned non-success status"
                );
                Err(CommerceError::Status {
                    status: status.as_u16(),
                    body: truncate(&body),
                })
            }
        }
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<Reply<T>, CommerceError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        self.send(self.inner.client.post(url).json(body)).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Reply<T>, CommerceError> {
        let url = self.endpoint(segments)?;
        self.send(self.inner.client.get(url)).await
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY).collect()
}

/// Unwrap a cart snapshot from a successful cart mutation.
fn expect_cart(reply: Reply<CartPayload>, fallback: &str) -> Result<Cart, CommerceError> {
    cart_from(reply.into_result(fallback)?)
}

fn cart_from(payload: CartPayload) -> Result<Cart, CommerceError> {
    let cart: WireCart = payload
        .cart
        .ok_or_else(|| CommerceError::InvalidResponse("success without cart".to_string()))?;
    convert_cart(cart)
}

// =============================================================================
// CommerceApi
// =============================================================================

impl CommerceApi for CommerceClient {
    #[instrument(skip(self))]
    async fn create_cart(&self) -> Result<Cart, CommerceError> {
        let reply = self
            .post(&["api", "cart", "create"], &CreateCartRequest {})
            .await?;
        let cart = expect_cart(reply, "Failed to create cart")?;
        debug!(cart_id = %cart.id, "Created cart");
        Ok(cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, CommerceError> {
        let reply: Reply<CartPayload> = self
            .post(
                &["api", "cart", "get"],
                &GetCartRequest {
                    cart_id: cart_id.as_str(),
                },
            )
            .await?;

        match reply {
            Reply::Success(payload) => cart_from(payload).map(Some),
            Reply::Failure { error } => {
                debug!(error = ?error, "Cart not recognized");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, variant_id = %variant_id))]
    async fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), CommerceError> {
        let reply: Reply<NoPayload> = self
            .post(
                &["api", "cart", "add"],
                &AddLineRequest {
                    cart_id: cart_id.as_str(),
                    variant_id: variant_id.as_str(),
                    quantity,
                },
            )
            .await?;
        reply.into_result("Failed to add to cart")?;
        Ok(())
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineUpdate],
    ) -> Result<Cart, CommerceError> {
        let request = UpdateLinesRequest {
            cart_id: cart_id.as_str(),
            lines: lines
                .iter()
                .map(|line| LineQuantity {
                    id: line.id.as_str(),
                    quantity: line.quantity,
                })
                .collect(),
        };
        let reply = self.post(&["api", "cart", "update"], &request).await?;
        expect_cart(reply, "Failed to update cart")
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id, lines = line_ids.len()))]
    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, CommerceError> {
        let request = RemoveLinesRequest {
            cart_id: cart_id.as_str(),
            line_ids: line_ids.iter().map(CartLineId::as_str).collect(),
        };
        let reply = self.post(&["api", "cart", "remove"], &request).await?;
        expect_cart(reply, "Failed to remove from cart")
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        // Check cache
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let reply: Reply<ProductsPayload> = self.get(&["api", "inventory"]).await?;
        let payload = reply.into_result("Failed to load products")?;
        let products = convert_products(payload.products.unwrap_or_default());

        self.inner
            .cache
            .insert(
                CacheKey::Products,
                CacheValue::Products(Arc::new(products.clone())),
            )
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn get_product(&self, handle: &str) -> Result<Product, CommerceError> {
        let cache_key = CacheKey::Product(handle.to_string());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let reply: Reply<ProductPayload> = self.get(&["api", "product", handle]).await?;
        let product = match reply {
            Reply::Success(ProductPayload {
                product: Some(product),
            }) => convert_product(product)?,
            Reply::Success(ProductPayload { product: None }) => {
                return Err(CommerceError::InvalidResponse(
                    "success without product".to_string(),
                ));
            }
            Reply::Failure { error } => {
                return Err(CommerceError::NotFound(
                    error.unwrap_or_else(|| format!("Product not found: {handle}")),
                ));
            }
        };

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CommerceClient {
        CommerceClient::new(&CommerceConfig::with_url(base).unwrap())
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = client("http://127.0.0.1:8080").endpoint(&["api", "inventory"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/inventory");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://shop.example/backend/")
            .endpoint(&["api", "cart", "get"])
            .unwrap();
        assert_eq!(url.as_str(), "https://shop.example/backend/api/cart/get");
    }

    #[test]
    fn test_endpoint_encodes_handle() {
        let url = client("https://shop.example")
            .endpoint(&["api", "product", "../admin?x=1"])
            .unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
        assert!(url.path().starts_with("/api/product/"));
    }

    #[test]
    fn test_truncate_limits_body() {
        let body = "x".repeat(MAX_LOGGED_BODY * 2);
        assert_eq!(truncate(&body).len(), MAX_LOGGED_BODY);
    }
}
