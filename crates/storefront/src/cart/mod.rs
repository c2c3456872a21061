//! Cart session client.
//!
//! A [`CartSession`] ties one visitor's persisted cart ID to the commerce
//! backend. It holds at most one cart snapshot and replaces it wholesale with
//! whatever the backend returns after every call; it never edits a snapshot
//! itself.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Loading -> Ready(cart)   (cart may be empty)
//!                          -> Failed(msg)   (unexpected failures only)
//! ```
//!
//! The cart ID is written to the store only when a cart is created.

mod events;
mod in_flight;
mod store;

#[cfg(test)]
pub(crate) mod fake;

pub use events::{CartChanged, CartEvents};
pub use in_flight::{InFlightGuard, InFlightLines};
pub use store::{CartIdStore, StoreError};

use meeple_core::{
    Cart, CartId, CartLineId, CartSummary, PriceError, Product, VariantId, clamp_quantity,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::commerce::{CommerceApi, CommerceError, LineUpdate};

/// Key the cart ID is persisted under.
pub const CART_ID_KEY: &str = "shopify-cart-id";

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The commerce backend failed or refused the request.
    #[error(transparent)]
    Boundary(#[from] CommerceError),

    /// Quantities below 1 cannot be added.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// There is no cart to change.
    #[error("No cart for this session")]
    NoCart,

    /// A change to this line is already being submitted.
    #[error("Line {0} is already being updated")]
    LineBusy(CartLineId),

    /// The product cannot be purchased right now.
    #[error("{0} is out of stock")]
    OutOfStock(String),

    /// The cart ID could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CartPhase {
    /// Nothing has been fetched yet.
    #[default]
    Uninitialized,
    /// A fetch or create is outstanding.
    Loading,
    /// The last backend snapshot.
    Ready(Cart),
    /// Initialization failed unexpectedly.
    Failed(String),
}

/// Coarse cart state for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Uninitialized,
    Loading,
    Empty,
    Ready,
    Error,
}

/// One visitor's view of their cart.
///
/// Built per request (web) or per invocation (CLI); the event channel and
/// in-flight registry are shared across sessions.
pub struct CartSession<A, S> {
    api: A,
    store: S,
    events: CartEvents,
    in_flight: InFlightLines,
    phase: CartPhase,
}

impl<A: CommerceApi, S: CartIdStore> CartSession<A, S> {
    /// Create an uninitialized session.
    pub fn new(api: A, store: S, events: CartEvents, in_flight: InFlightLines) -> Self {
        Self {
            api,
            store,
            events,
            in_flight,
            phase: CartPhase::Uninitialized,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> &CartPhase {
        &self.phase
    }

    /// Current snapshot, if one has been adopted.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        match &self.phase {
            CartPhase::Ready(cart) => Some(cart),
            _ => None,
        }
    }

    /// Coarse state for views.
    #[must_use]
    pub fn status(&self) -> CartStatus {
        match &self.phase {
            CartPhase::Uninitialized => CartStatus::Uninitialized,
            CartPhase::Loading => CartStatus::Loading,
            CartPhase::Ready(cart) if cart.is_empty() => CartStatus::Empty,
            CartPhase::Ready(_) => CartStatus::Ready,
            CartPhase::Failed(_) => CartStatus::Error,
        }
    }

    /// Display totals for the current snapshot, `None` without one.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total is out of range.
    pub fn summary(&self, shipping: Decimal) -> Result<Option<CartSummary>, PriceError> {
        self.cart().map(|cart| cart.summary(shipping)).transpose()
    }

    /// Checkout hand-off URL for the current snapshot. No backend call.
    #[must_use]
    pub fn checkout(&self) -> Option<&str> {
        self.cart()
            .map(|cart| cart.checkout_url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Load the persisted cart, or create one.
    ///
    /// Never leaves the session `Loading`. Failures are logged and recorded as
    /// `Failed` rather than returned.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> &CartPhase {
        self.phase = CartPhase::Loading;
        self.phase = match self.load_or_create().await {
            Ok(cart) => CartPhase::Ready(cart),
            Err(e) => {
                error!(error = %e, "Error initializing cart");
                CartPhase::Failed(e.to_string())
            }
        };
        &self.phase
    }

    /// Re-read the persisted cart without ever creating one.
    ///
    /// A cart the backend no longer recognizes leaves the session
    /// uninitialized.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the store or backend fails.
    #[instrument(skip(self))]
    pub async fn resync(&mut self) -> Result<Option<&Cart>, CartError> {
        let Some(cart_id) = self.known_cart_id().await? else {
            return Ok(None);
        };

        self.phase = match self.api.get_cart(&cart_id).await? {
            Some(cart) => CartPhase::Ready(cart),
            None => CartPhase::Uninitialized,
        };
        Ok(self.cart())
    }

    /// Add a variant, creating the cart first if the visitor has none.
    ///
    /// The backend returns no snapshot for an add, so the cart is re-read
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for 0, or the backend/store error.
    /// The previous snapshot is kept on failure.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_line(&mut self, variant_id: &VariantId, quantity: u32) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let cart_id = match self.known_cart_id().await? {
            Some(id) => id,
            None => self.create_and_persist().await?.id,
        };

        self.api.add_line(&cart_id, variant_id, quantity).await?;
        let cart = self
            .api
            .get_cart(&cart_id)
            .await?
            .ok_or(CartError::NoCart)?;

        Ok(self.adopt(cart))
    }

    /// Add a product, clamping the quantity to what is in stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfStock` if the product cannot be bought, or
    /// any error from [`Self::add_line`].
    pub async fn add_product(&mut self, product: &Product, requested: u32) -> Result<Cart, CartError> {
        let variant_id = product
            .variant_id
            .as_ref()
            .filter(|_| product.in_stock)
            .ok_or_else(|| CartError::OutOfStock(product.title.clone()))?;
        let quantity = clamp_quantity(requested, product.quantity)
            .ok_or_else(|| CartError::OutOfStock(product.title.clone()))?;

        if quantity != requested {
            debug!(requested, quantity, "Clamped add-to-cart quantity");
        }

        self.add_line(variant_id, quantity).await
    }

    /// Set a line's quantity; 0 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineBusy` if a change to the same line is still
    /// outstanding, `CartError::NoCart` if the visitor has no cart, or the
    /// backend error. The previous snapshot is kept on failure.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn set_line_quantity(
        &mut self,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let cart_id = self.known_cart_id().await?.ok_or(CartError::NoCart)?;

        let _guard = self
            .in_flight
            .try_begin(&cart_id, line_id)
            .ok_or_else(|| CartError::LineBusy(line_id.clone()))?;

        let cart = if quantity == 0 {
            self.api
                .remove_lines(&cart_id, std::slice::from_ref(line_id))
                .await?
        } else {
            self.api
                .update_lines(
                    &cart_id,
                    &[LineUpdate {
                        id: line_id.clone(),
                        quantity,
                    }],
                )
                .await?
        };

        Ok(self.adopt(cart))
    }

    /// Remove a line. Same as setting its quantity to 0.
    ///
    /// # Errors
    ///
    /// See [`Self::set_line_quantity`].
    pub async fn remove_line(&mut self, line_id: &CartLineId) -> Result<Cart, CartError> {
        self.set_line_quantity(line_id, 0).await
    }

    async fn load_or_create(&mut self) -> Result<Cart, CartError> {
        if let Some(cart_id) = self.store.load_cart_id().await? {
            if let Some(cart) = self.api.get_cart(&cart_id).await? {
                return Ok(cart);
            }
            warn!(cart_id = %cart_id, "Persisted cart no longer exists, creating a new one");
        }

        self.create_and_persist().await
    }

    async fn create_and_persist(&mut self) -> Result<Cart, CartError> {
        let cart = self.api.create_cart().await?;
        self.store.save_cart_id(&cart.id).await?;
        debug!(cart_id = %cart.id, "Persisted new cart id");
        Ok(cart)
    }

    /// The cart ID in play: the adopted snapshot's, else the persisted one.
    async fn known_cart_id(&self) -> Result<Option<CartId>, CartError> {
        if let Some(cart) = self.cart() {
            return Ok(Some(cart.id.clone()));
        }
        Ok(self.store.load_cart_id().await?)
    }

    /// Replace the snapshot and announce the change.
    fn adopt(&mut self, cart: Cart) -> Cart {
        self.events.publish(CartChanged {
            cart_id: cart.id.clone(),
            total_quantity: cart.line_quantity(),
        });
        self.phase = CartPhase::Ready(cart.clone());
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fake::{FakeCommerce, MemoryCartIdStore};
    use super::*;

    type Session = CartSession<FakeCommerce, MemoryCartIdStore>;

    fn session(api: &FakeCommerce, store: &MemoryCartIdStore) -> Session {
        CartSession::new(
            api.clone(),
            store.clone(),
            CartEvents::new(),
            InFlightLines::new(),
        )
    }

    async fn cart_with_lines(api: &FakeCommerce, store: &MemoryCartIdStore) -> Cart {
        let mut s = session(api, store);
        s.add_line(&VariantId::new("azul"), 2).await.unwrap();
        s.add_line(&VariantId::new("catan"), 1).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_without_id_creates_exactly_one_cart() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        s.initialize().await;

        assert_eq!(api.calls().create, 1);
        assert_eq!(api.calls().get, 0);
        let cart = s.cart().unwrap();
        assert_eq!(store.load_cart_id().await.unwrap(), Some(cart.id.clone()));
        assert_eq!(store.writes(), 1);
        assert_eq!(s.status(), CartStatus::Empty);
    }

    #[tokio::test]
    async fn test_initialize_reuses_persisted_cart() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        session(&api, &store).initialize().await;

        let mut again = session(&api, &store);
        again.initialize().await;

        assert_eq!(api.calls().create, 1);
        assert_eq!(api.calls().get, 1);
        assert_eq!(store.writes(), 1);
        assert!(again.cart().is_some());
    }

    #[tokio::test]
    async fn test_initialize_replaces_unknown_cart() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::with_id(CartId::new("expired"));
        let mut s = session(&api, &store);

        s.initialize().await;

        assert_eq!(api.calls().get, 1);
        assert_eq!(api.calls().create, 1);
        let new_id = s.cart().unwrap().id.clone();
        assert_ne!(new_id.as_str(), "expired");
        assert_eq!(store.load_cart_id().await.unwrap(), Some(new_id));
    }

    #[tokio::test]
    async fn test_initialize_never_stays_loading() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        assert_eq!(s.status(), CartStatus::Uninitialized);
        let phase = s.initialize().await.clone();
        assert!(!matches!(phase, CartPhase::Loading | CartPhase::Uninitialized));
    }

    #[tokio::test]
    async fn test_add_line_creates_cart_and_rereads() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        let cart = s.add_line(&VariantId::new("azul"), 2).await.unwrap();

        assert_eq!(api.calls().create, 1);
        assert_eq!(api.calls().add, 1);
        assert_eq!(api.calls().get, 1);
        assert_eq!(cart.line_quantity(), 2);
        assert_eq!(s.cart(), Some(&cart));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_add_line_rejects_zero() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        let err = s.add_line(&VariantId::new("azul"), 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
        assert_eq!(api.calls(), fake::Calls::default());
    }

    #[tokio::test]
    async fn test_zero_quantity_matches_remove() {
        let api = FakeCommerce::new();
        let store_a = MemoryCartIdStore::new();
        let store_b = MemoryCartIdStore::new();
        let a = cart_with_lines(&api, &store_a).await;
        let b = cart_with_lines(&api, &store_b).await;

        let line_a = a.lines[0].id.clone();
        let line_b = b.lines[0].id.clone();

        let via_zero = session(&api, &store_a)
            .set_line_quantity(&line_a, 0)
            .await
            .unwrap();
        let via_remove = session(&api, &store_b).remove_line(&line_b).await.unwrap();

        assert_eq!(via_zero.lines.len(), via_remove.lines.len());
        assert_eq!(via_zero.total_quantity, via_remove.total_quantity);
        assert_eq!(via_zero.estimated_total, via_remove.estimated_total);
        assert!(via_zero.line(&line_a).is_none());
        assert!(via_remove.line(&line_b).is_none());
        assert_eq!(api.calls().remove, 2);
        assert_eq!(api.calls().update, 0);
    }

    #[tokio::test]
    async fn test_set_quantity_sends_single_update() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let cart = cart_with_lines(&api, &store).await;
        let line = cart.lines[0].id.clone();

        let mut s = session(&api, &store);
        let cart = s.set_line_quantity(&line, 5).await.unwrap();

        assert_eq!(api.calls().update, 1);
        assert_eq!(cart.line(&line).unwrap().quantity, 5);
        let summary = s.summary(Decimal::new(599, 2)).unwrap().unwrap();
        assert_eq!(summary.total_quantity, cart.line_quantity());
        assert_eq!(summary.total_quantity, 6);
        assert_eq!(summary.subtotal, cart.estimated_total);
        assert_eq!(summary.total.to_string(), "$65.99");
    }

    #[tokio::test]
    async fn test_line_busy_while_in_flight() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let cart = cart_with_lines(&api, &store).await;
        let line = cart.lines[0].id.clone();

        let in_flight = InFlightLines::new();
        let mut s = CartSession::new(api.clone(), store.clone(), CartEvents::new(), in_flight.clone());

        let guard = in_flight.try_begin(&cart.id, &line).unwrap();
        let err = s.set_line_quantity(&line, 3).await.unwrap_err();
        assert!(matches!(err, CartError::LineBusy(_)));
        assert_eq!(api.calls().update, 0);

        drop(guard);
        s.set_line_quantity(&line, 3).await.unwrap();
        assert!(!in_flight.is_in_flight(&cart.id, &line));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_snapshot_and_clears_flag() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        cart_with_lines(&api, &store).await;

        let in_flight = InFlightLines::new();
        let mut s = CartSession::new(api.clone(), store.clone(), CartEvents::new(), in_flight.clone());
        s.initialize().await;
        let before = s.cart().cloned().unwrap();
        let line = before.lines[0].id.clone();

        api.reject_mutations("Line not found");
        let err = s.set_line_quantity(&line, 4).await.unwrap_err();

        assert_eq!(err.to_string(), "Rejected: Line not found");
        assert_eq!(s.cart(), Some(&before));
        assert!(!in_flight.is_in_flight(&before.id, &line));
    }

    #[tokio::test]
    async fn test_set_quantity_without_cart() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        let err = s
            .set_line_quantity(&CartLineId::new("line-1"), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NoCart));
        assert_eq!(api.calls().create, 0);
    }

    #[tokio::test]
    async fn test_mutations_publish_changes() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let events = CartEvents::new();
        let mut rx = events.subscribe();
        let mut s = CartSession::new(api.clone(), store.clone(), events, InFlightLines::new());

        s.initialize().await;
        assert!(rx.try_recv().is_err());

        let cart = s.add_line(&VariantId::new("azul"), 3).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.cart_id, cart.id);
        assert_eq!(event.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_resync_never_creates() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        assert!(s.resync().await.unwrap().is_none());
        assert_eq!(api.calls().create, 0);

        let cart = cart_with_lines(&api, &store).await;
        let mut s = session(&api, &store);
        assert_eq!(s.resync().await.unwrap(), Some(&cart));

        api.expire(&cart.id);
        let mut s = session(&api, &store);
        assert!(s.resync().await.unwrap().is_none());
        assert_eq!(s.status(), CartStatus::Uninitialized);
        assert_eq!(api.calls().create, 1);
    }

    #[tokio::test]
    async fn test_checkout_is_pure() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);
        assert!(s.checkout().is_none());

        s.initialize().await;
        let calls = api.calls();
        let url = s.checkout().unwrap().to_string();

        assert!(url.starts_with("https://shop.example/checkout/"));
        assert_eq!(api.calls(), calls);
    }

    #[tokio::test]
    async fn test_add_product_clamps_and_checks_stock() {
        let api = FakeCommerce::new();
        let store = MemoryCartIdStore::new();
        let mut s = session(&api, &store);

        let mut product = Product {
            id: meeple_core::ProductId::new("p1"),
            title: "Azul".to_string(),
            handle: "azul".to_string(),
            description_html: String::new(),
            price: meeple_core::Price::zero(meeple_core::CurrencyCode::USD),
            in_stock: true,
            quantity: 2,
            variant_id: Some(VariantId::new("azul")),
            featured_image: None,
            images: Vec::new(),
        };

        let cart = s.add_product(&product, 9).await.unwrap();
        assert_eq!(cart.line_quantity(), 2);

        product.in_stock = false;
        let err = s.add_product(&product, 1).await.unwrap_err();
        assert!(matches!(err, CartError::OutOfStock(_)));
    }
}
