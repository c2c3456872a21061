//! Cart route handlers.
//!
//! Line changes use HTMX: the response is the refreshed lines fragment plus
//! an `HX-Trigger: cart-updated` header that makes the header badge reload.
//! Plain form posts (no JavaScript) get a redirect back to `/cart`.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use async_stream::stream;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{
        AppendHeaders, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::Stream;
use meeple_core::{Cart, CartLine, CartLineId, CartSummary};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tower_sessions::Session;
use tracing::{debug, error, instrument, warn};

use super::games::{ImageView, encode_segment};
use super::{CART_UPDATED, HX_RESWAP, HX_RETARGET, HX_TRIGGER, is_htmx};
use crate::cart::{CartError, CartIdStore, CartPhase};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Shown when a line change fails.
const UPDATE_ERROR: &str = "Error updating cart";

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    /// Line ID, percent-encoded for use in URLs.
    pub path_id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image: Option<ImageView>,
}

impl CartLineView {
    /// Quantity submitted by the minus button; 0 removes the line.
    #[must_use]
    pub const fn decrement(&self) -> u32 {
        self.quantity.saturating_sub(1)
    }

    /// Quantity submitted by the plus button.
    #[must_use]
    pub const fn increment(&self) -> u32 {
        self.quantity.saturating_add(1)
    }
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            path_id: encode_segment(line.id.as_str()),
            handle: merchandise.product_handle.clone(),
            title: merchandise.product_title.clone(),
            variant_title: merchandise.display_variant_title().map(String::from),
            quantity: line.quantity,
            unit_price: merchandise.price.to_string(),
            line_total: line.total.to_string(),
            image: merchandise.image.as_ref().map(ImageView::from),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

impl CartView {
    fn new(cart: &Cart, summary: &CartSummary) -> Self {
        Self {
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            item_count: summary.total_quantity,
            subtotal: summary.subtotal.to_string(),
            shipping: summary.shipping.to_string(),
            total: summary.total.to_string(),
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// `None` (the "unable to load" state) when the totals cannot be computed.
fn cart_view(state: &AppState, cart: &Cart) -> Option<CartView> {
    match cart.summary(state.store().standard_shipping) {
        Ok(summary) => Some(CartView::new(cart, &summary)),
        Err(e) => {
            error!(error = %e, cart_id = %cart.id, "Cart totals out of range");
            None
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub store_name: String,
    /// `None` when the cart could not be loaded.
    pub cart: Option<CartView>,
    pub error: Option<&'static str>,
    pub processing_time: String,
}

/// Cart lines and totals fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_lines.html")]
pub struct CartLinesTemplate {
    pub cart: Option<CartView>,
}

/// Cart count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error fragment, swapped into `#cart-error`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Cart page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    /// Set after a failed non-HTMX line change.
    pub error: Option<String>,
}

/// Display the cart page.
///
/// Loads the visitor's cart, creating one if they have none.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CartQuery>,
) -> impl IntoResponse {
    let mut cart = state.cart_session(session);

    let view = match cart.initialize().await {
        CartPhase::Ready(snapshot) => cart_view(&state, snapshot),
        phase => {
            debug!(phase = ?phase, "Cart unavailable");
            None
        }
    };

    CartShowTemplate {
        store_name: state.store().name.clone(),
        cart: view,
        error: query.error.is_some().then_some(UPDATE_ERROR),
        processing_time: state.store().processing_time.clone(),
    }
}

/// Set quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

/// Set a line's quantity (HTMX). A quantity of 0 removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    Path(line_id): Path<String>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    change_line(&state, session, &headers, CartLineId::new(line_id), form.quantity).await
}

/// Remove a line (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    Path(line_id): Path<String>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    change_line(&state, session, &headers, CartLineId::new(line_id), 0).await
}

/// Shared body of `update` and `remove`.
///
/// A duplicate submission for a line still in flight is a 409, which HTMX
/// leaves unswapped. Other failures keep the current lines on screen and
/// show an inline error.
async fn change_line(
    state: &AppState,
    session: Session,
    headers: &HeaderMap,
    line_id: CartLineId,
    quantity: u32,
) -> Result<Response, AppError> {
    let htmx = is_htmx(headers);
    let mut cart = state.cart_session(session);

    match cart.set_line_quantity(&line_id, quantity).await {
        Ok(snapshot) => {
            if !htmx {
                return Ok(Redirect::to("/cart").into_response());
            }
            Ok((
                AppendHeaders([(HX_TRIGGER, CART_UPDATED)]),
                CartLinesTemplate {
                    cart: cart_view(state, &snapshot),
                },
            )
                .into_response())
        }
        Err(e @ CartError::LineBusy(_)) => {
            warn!(error = %e, "Duplicate line submission");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Error updating cart");
            if !htmx {
                return Ok(Redirect::to("/cart?error=update").into_response());
            }
            Ok((
                AppendHeaders([(HX_RETARGET, "#cart-error"), (HX_RESWAP, "innerHTML")]),
                CartErrorTemplate {
                    message: UPDATE_ERROR,
                },
            )
                .into_response())
        }
    }
}

/// Get cart count badge (HTMX).
///
/// Never creates a cart; visitors without one see 0.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut cart = state.cart_session(session);

    let count = match cart.resync().await {
        Ok(snapshot) => snapshot.map_or(0, Cart::line_quantity),
        Err(e) => {
            warn!(error = %e, "Failed to fetch cart count");
            0
        }
    };

    CartCountTemplate { count }
}

/// Stream `cart-updated` events for the visitor's cart.
///
/// Each event carries the new total quantity. Changes to other visitors'
/// carts are filtered out.
#[instrument(skip(state, session))]
pub async fn events(
    State(state): State<AppState>,
    session: Session,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut changes = state.cart_events().subscribe();

    let stream = stream! {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    let current = match session.load_cart_id().await {
                        Ok(id) => id,
                        Err(e) => {
                            warn!(error = %e, "Failed to read cart id for event stream");
                            None
                        }
                    };
                    if current.as_ref() == Some(&change.cart_id) {
                        yield Ok::<Event, Infallible>(
                            Event::default()
                                .event(CART_UPDATED)
                                .data(change.total_quantity.to_string()),
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Cart event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Redirect to the platform checkout.
///
/// Visitors without a cart (or whose cart expired) go back to `/cart`.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let mut cart = state.cart_session(session);

    if let Err(e) = cart.resync().await {
        error!(error = %e, "Failed to get cart for checkout");
        return Redirect::to("/cart").into_response();
    }

    match cart.checkout() {
        Some(url) if cart.cart().is_some_and(|c| !c.is_empty()) => {
            Redirect::to(url).into_response()
        }
        _ => Redirect::to("/cart").into_response(),
    }
}
