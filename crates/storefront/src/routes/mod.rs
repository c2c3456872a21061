//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page
//! GET  /health                      - Health check
//! GET  /help                        - FAQs and policies
//!
//! # Games
//! GET  /games                       - Game listing (?sort, ?order, ?view)
//! GET  /games/:handle               - Game detail (?image)
//! POST /games/:handle/cart          - Add to cart (redirects to /cart)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                        - Cart page
//! POST /cart/lines/:line_id         - Set quantity (returns cart_lines fragment)
//! POST /cart/lines/:line_id/remove  - Remove line (returns cart_lines fragment)
//! GET  /cart/count                  - Cart count badge (fragment)
//! GET  /cart/events                 - Cart change stream (SSE)
//!
//! # Checkout
//! GET  /checkout                    - Redirect to platform checkout
//! ```

pub mod cart;
pub mod games;
pub mod help;
pub mod home;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::state::AppState;

/// Response header that fires client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";
/// Response header that overrides the swap target.
pub const HX_RETARGET: &str = "HX-Retarget";
/// Response header that overrides the swap strategy.
pub const HX_RESWAP: &str = "HX-Reswap";
/// Event fired after any cart mutation.
pub const CART_UPDATED: &str = "cart-updated";

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Create the game routes router.
pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(games::index))
        .route("/{handle}", get(games::show))
        .route("/{handle}/cart", post(games::add_to_cart))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/lines/{line_id}", post(cart::update))
        .route("/lines/{line_id}/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/help", get(help::help))
        .nest("/games", game_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
}
