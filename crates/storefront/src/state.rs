//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::cart::{CartEvents, CartSession, InFlightLines};
use crate::commerce::CommerceClient;
use crate::config::{StoreProfile, StorefrontConfig};

/// Cart session for one web request.
pub type WebCartSession = CartSession<CommerceClient, Session>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// commerce client, configuration, and the cart change channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    events: CartEvents,
    in_flight: InFlightLines,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let commerce = CommerceClient::new(&config.commerce);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                events: CartEvents::new(),
                in_flight: InFlightLines::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store profile.
    #[must_use]
    pub fn store(&self) -> &StoreProfile {
        &self.inner.config.store
    }

    /// Get a reference to the commerce backend client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the cart change channel.
    #[must_use]
    pub fn cart_events(&self) -> &CartEvents {
        &self.inner.events
    }

    /// Build the cart session for a visitor.
    #[must_use]
    pub fn cart_session(&self, session: Session) -> WebCartSession {
        CartSession::new(
            self.inner.commerce.clone(),
            session,
            self.inner.events.clone(),
            self.inner.in_flight.clone(),
        )
    }
}
