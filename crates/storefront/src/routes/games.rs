//! Game catalog route handlers.
//!
//! The listing fetches the whole collection once (cached by the commerce
//! client) and sorts it per request from the `sort`, `order`, and `view`
//! query parameters.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use meeple_core::{Gallery, Image, Product, SortKey, SortOrder, ViewMode, sort_products};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, instrument, warn};

use crate::cart::CartError;
use crate::commerce::{CommerceApi, CommerceError};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::state::AppState;

/// Shown when the backend could not be reached at all.
const CONNECTION_ERROR: &str = "Failed to connect to the server";

/// Shown on the detail page after a failed add-to-cart.
const ADD_ERROR: &str = "Error adding to cart";

// =============================================================================
// Views
// =============================================================================

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            url: image.url.clone(),
            alt: image.alt.clone(),
        }
    }
}

/// Product card for the listing.
#[derive(Clone)]
pub struct GameCard {
    pub handle: String,
    pub title: String,
    pub price: String,
    pub in_stock: bool,
    pub image: Option<ImageView>,
}

impl From<&Product> for GameCard {
    fn from(product: &Product) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            price: product.price.to_string(),
            in_stock: product.in_stock,
            image: product.primary_image().map(ImageView::from),
        }
    }
}

/// Product detail display data.
#[derive(Clone)]
pub struct GameDetail {
    pub handle: String,
    pub title: String,
    pub description_html: String,
    pub price: String,
    pub in_stock: bool,
    pub purchasable: bool,
    pub quantity: u32,
    pub variant_id: String,
}

impl From<&Product> for GameDetail {
    fn from(product: &Product) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            description_html: product.description_html.clone(),
            price: product.price.to_string(),
            in_stock: product.in_stock,
            purchasable: product.is_purchasable() && product.quantity > 0,
            quantity: product.quantity,
            variant_id: product
                .variant_id
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Gallery images for a product: its images, else just the featured one.
fn gallery_images(product: &Product) -> Vec<ImageView> {
    if product.images.is_empty() {
        product
            .featured_image
            .iter()
            .map(ImageView::from)
            .collect()
    } else {
        product.images.iter().map(ImageView::from).collect()
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub view: ViewMode,
}

/// Game listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "games/index.html")]
pub struct GamesIndexTemplate {
    pub store_name: String,
    pub games: Vec<GameCard>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub view: ViewMode,
    pub error: Option<String>,
}

impl GamesIndexTemplate {
    /// Link that sorts by name, keeping order and view.
    #[must_use]
    pub fn name_sort_link(&self) -> String {
        listing_link(SortKey::Name, self.order, self.view)
    }

    /// Link that sorts by price, keeping order and view.
    #[must_use]
    pub fn price_sort_link(&self) -> String {
        listing_link(SortKey::Price, self.order, self.view)
    }

    /// Link that flips the sort direction.
    #[must_use]
    pub fn order_link(&self) -> String {
        listing_link(self.sort, self.order.toggled(), self.view)
    }

    #[must_use]
    pub fn grid_link(&self) -> String {
        listing_link(self.sort, self.order, ViewMode::Grid)
    }

    #[must_use]
    pub fn list_link(&self) -> String {
        listing_link(self.sort, self.order, ViewMode::List)
    }

    #[must_use]
    pub fn is_sorted_by_price(&self) -> bool {
        self.sort == SortKey::Price
    }

    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Desc
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.view == ViewMode::List
    }
}

fn listing_link(sort: SortKey, order: SortOrder, view: ViewMode) -> String {
    format!(
        "/games?sort={}&order={}&view={}",
        sort.as_str(),
        order.as_str(),
        view.as_str()
    )
}

/// Display the game listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let (games, error) = match state.commerce().list_products().await {
        Ok(products) => {
            let sorted = sort_products(&products, query.sort, query.order);
            (sorted.iter().map(GameCard::from).collect(), None)
        }
        Err(e) if e.is_transport() => {
            error!(error = %e, "Error fetching products");
            (Vec::new(), Some(CONNECTION_ERROR.to_string()))
        }
        Err(CommerceError::Rejected(message)) => {
            warn!(error = %message, "Product listing rejected");
            (Vec::new(), Some(message))
        }
        Err(e) => {
            error!(error = %e, "Error fetching products");
            (Vec::new(), Some(e.to_string()))
        }
    };

    GamesIndexTemplate {
        store_name: state.store().name.clone(),
        games,
        sort: query.sort,
        order: query.order,
        view: query.view,
        error,
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Detail query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Gallery position.
    pub image: Option<usize>,
    /// Set after a failed add-to-cart.
    pub error: Option<String>,
}

/// A gallery thumbnail.
pub struct Thumbnail<'a> {
    pub image: &'a ImageView,
    pub link: String,
    pub current: bool,
}

/// Game detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "games/show.html")]
pub struct GameShowTemplate {
    pub store_name: String,
    pub game: GameDetail,
    pub images: Vec<ImageView>,
    pub gallery: Gallery,
    pub error: Option<&'static str>,
}

impl GameShowTemplate {
    /// Image at the current gallery position.
    #[must_use]
    pub fn current_image(&self) -> Option<&ImageView> {
        self.images.get(self.gallery.index())
    }

    /// Link to a gallery position.
    #[must_use]
    pub fn image_link(&self, index: usize) -> String {
        format!("/games/{}?image={index}", encode_segment(&self.game.handle))
    }

    /// Gallery thumbnails with their jump links.
    #[must_use]
    pub fn thumbnails(&self) -> Vec<Thumbnail<'_>> {
        self.images
            .iter()
            .enumerate()
            .map(|(index, image)| Thumbnail {
                image,
                link: self.image_link(index),
                current: self.gallery.index() == index,
            })
            .collect()
    }

    #[must_use]
    pub fn previous_link(&self) -> String {
        self.image_link(self.gallery.previous_index())
    }

    #[must_use]
    pub fn next_link(&self) -> String {
        self.image_link(self.gallery.next_index())
    }
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub store_name: String,
}

/// Render the not-found page with a 404 status.
pub fn not_found(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            store_name: state.store().name.clone(),
        },
    )
        .into_response()
}

/// Display a game's detail page.
///
/// Any failure to load the product renders the not-found page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let product = match state.commerce().get_product(&handle).await {
        Ok(product) => product,
        Err(e) => {
            warn!(error = %e, "Product unavailable");
            return not_found(&state);
        }
    };

    let images = gallery_images(&product);
    let gallery = Gallery::at(images.len(), query.image.unwrap_or(0));

    GameShowTemplate {
        store_name: state.store().name.clone(),
        game: GameDetail::from(&product),
        images,
        gallery,
        error: query.error.is_some().then_some(ADD_ERROR),
    }
    .into_response()
}

// =============================================================================
// Add to cart
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Add a game to the visitor's cart, then go to the cart page.
///
/// The quantity is clamped to available stock. Failures return to the detail
/// page with an error banner.
#[instrument(skip(state, session, form))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let back = format!("/games/{}?error=add", encode_segment(&handle));

    let product = match state.commerce().get_product(&handle).await {
        Ok(product) => product,
        Err(e) => {
            error!(error = %e, "Error adding to cart");
            return Redirect::to(&back).into_response();
        }
    };

    if product.variant_id.as_ref().map(|id| id.as_str()) != Some(form.variant_id.as_str()) {
        warn!(variant_id = %form.variant_id, "Variant does not belong to product");
        return Redirect::to(&back).into_response();
    }

    let mut cart = state.cart_session(session);
    match cart
        .add_product(&product, form.quantity.unwrap_or(1))
        .await
    {
        Ok(snapshot) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[("handle", &product.handle), ("cart_id", snapshot.id.as_str())],
            );
            Redirect::to("/cart").into_response()
        }
        Err(CartError::OutOfStock(title)) => {
            warn!(title = %title, "Add to cart refused, out of stock");
            Redirect::to(&back).into_response()
        }
        Err(e) => {
            error!(error = %e, "Error adding to cart");
            Redirect::to(&back).into_response()
        }
    }
}

/// Percent-encode a value for use as one path segment.
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_links_keep_other_parameters() {
        let page = GamesIndexTemplate {
            store_name: String::new(),
            games: Vec::new(),
            sort: SortKey::Price,
            order: SortOrder::Desc,
            view: ViewMode::List,
            error: None,
        };

        assert_eq!(
            page.name_sort_link(),
            "/games?sort=name&order=desc&view=list"
        );
        assert_eq!(
            page.order_link(),
            "/games?sort=price&order=asc&view=list"
        );
        assert_eq!(
            page.grid_link(),
            "/games?sort=price&order=desc&view=grid"
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("ticket-to-ride"), "ticket-to-ride");
        assert_eq!(
            encode_segment("gid://shop/CartLine/1?cart=2"),
            "gid%3A%2F%2Fshop%2FCartLine%2F1%3Fcart%3D2"
        );
        // A space must survive axum's path decoding, so no `+`.
        assert_eq!(encode_segment("root deluxe"), "root%20deluxe");
    }
}
