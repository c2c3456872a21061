//! Integration tests for the Meeple & Co. storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p meeple-integration-tests
//! ```
//!
//! Every test gets its own [`TestContext`]: an in-process fake commerce
//! backend on an ephemeral port, the real storefront router pointed at it,
//! and a cookie-holding HTTP client. Nothing outside the process is needed.
//!
//! # Fake backend catalog
//!
//! | Handle | Price | Stock |
//! |---|---|---|
//! | `catan` | $49.99 | 5 (two images) |
//! | `azul` | $39.99 | 2 |
//! | `wingspan` | $64.99 | sold out |

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use meeple_storefront::config::{CommerceConfig, StoreProfile, StorefrontConfig};
use meeple_storefront::state::AppState;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

// =============================================================================
// Fake commerce backend
// =============================================================================

/// Calls received by the fake backend, per route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub create: usize,
    pub get: usize,
    pub add: usize,
    pub update: usize,
    pub remove: usize,
    pub inventory: usize,
    pub product: usize,
}

struct FakeProduct {
    handle: &'static str,
    title: &'static str,
    price_cents: u64,
    quantity: i64,
    in_stock: bool,
    variant_id: &'static str,
    images: Vec<&'static str>,
}

impl FakeProduct {
    fn to_json(&self) -> Value {
        let images: Vec<Value> = self
            .images
            .iter()
            .map(|url| json!({ "url": url, "alt": self.title }))
            .collect();
        json!({
            "id": format!("product-{}", self.handle),
            "title": self.title,
            "handle": self.handle,
            "description": format!("<p>{} is a board game.</p>", self.title),
            "price": money(self.price_cents),
            "currency": "USD",
            "inStock": self.in_stock,
            "quantity": self.quantity,
            "variantId": self.variant_id,
            "featuredImage": images.first().cloned(),
            "images": images,
        })
    }
}

struct FakeLine {
    id: String,
    variant_id: String,
    quantity: u64,
}

#[derive(Default)]
struct FakeCart {
    lines: Vec<FakeLine>,
    next_line: usize,
}

struct BackendState {
    base_url: String,
    products: Vec<FakeProduct>,
    carts: HashMap<String, FakeCart>,
    next_cart: usize,
    calls: Calls,
    rejected: Option<String>,
}

impl BackendState {
    fn product_by_variant(&self, variant_id: &str) -> Option<&FakeProduct> {
        self.products.iter().find(|p| p.variant_id == variant_id)
    }

    fn cart_json(&self, cart_id: &str) -> Option<Value> {
        let cart = self.carts.get(cart_id)?;
        let mut total_cents = 0;
        let mut total_quantity = 0;

        let edges: Vec<Value> = cart
            .lines
            .iter()
            .filter_map(|line| {
                let product = self.product_by_variant(&line.variant_id)?;
                let line_cents = product.price_cents * line.quantity;
                total_cents += line_cents;
                total_quantity += line.quantity;
                Some(json!({
                    "node": {
                        "id": line.id,
                        "quantity": line.quantity,
                        "merchandise": {
                            "id": product.variant_id,
                            "title": "Default Title",
                            "product": { "title": product.title, "handle": product.handle },
                            "price": { "amount": money(product.price_cents), "currencyCode": "USD" },
                            "image": product.images.first().map(|url| json!({ "url": url, "altText": null })),
                        },
                        "estimatedCost": {
                            "totalAmount": { "amount": money(line_cents), "currencyCode": "USD" }
                        }
                    }
                }))
            })
            .collect();

        Some(json!({
            "id": cart_id,
            "checkoutUrl": format!("{}/checkout/{cart_id}", self.base_url),
            "totalQuantity": total_quantity,
            "estimatedCost": {
                "totalAmount": { "amount": money(total_cents), "currencyCode": "USD" }
            },
            "lines": { "edges": edges },
        }))
    }
}

fn money(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn default_catalog() -> Vec<FakeProduct> {
    vec![
        FakeProduct {
            handle: "catan",
            title: "Catan",
            price_cents: 4999,
            quantity: 5,
            in_stock: true,
            variant_id: "variant-catan",
            images: vec![
                "https://cdn.meeple.example/catan-box.jpg",
                "https://cdn.meeple.example/catan-board.jpg",
            ],
        },
        FakeProduct {
            handle: "azul",
            title: "Azul",
            price_cents: 3999,
            quantity: 2,
            in_stock: true,
            variant_id: "variant-azul",
            images: vec!["https://cdn.meeple.example/azul.jpg"],
        },
        FakeProduct {
            handle: "wingspan",
            title: "Wingspan",
            price_cents: 6499,
            quantity: 0,
            in_stock: false,
            variant_id: "variant-wingspan",
            images: Vec::new(),
        },
    ]
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

fn cart_reply(state: &BackendState, cart_id: &str) -> Response {
    match state.cart_json(cart_id) {
        Some(cart) => Json(json!({ "success": true, "cart": cart })).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Cart not found"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartIdBody {
    cart_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    cart_id: String,
    variant_id: String,
    quantity: u64,
}

#[derive(Deserialize)]
struct LineQuantity {
    id: String,
    quantity: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody {
    cart_id: String,
    lines: Vec<LineQuantity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBody {
    cart_id: String,
    line_ids: Vec<String>,
}

async fn create_cart(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.calls.create += 1;
    state.next_cart += 1;
    let cart_id = format!("cart-{}", state.next_cart);
    state.carts.insert(cart_id.clone(), FakeCart::default());
    cart_reply(&state, &cart_id)
}

async fn get_cart(State(state): State<Shared>, Json(body): Json<CartIdBody>) -> Response {
    let mut state = lock(&state);
    state.calls.get += 1;
    cart_reply(&state, &body.cart_id)
}

async fn add_line(State(state): State<Shared>, Json(body): Json<AddBody>) -> Response {
    let mut guard = lock(&state);
    let state = &mut *guard;
    state.calls.add += 1;

    if let Some(message) = &state.rejected {
        return failure(StatusCode::BAD_REQUEST, message);
    }
    if state.product_by_variant(&body.variant_id).is_none() {
        return failure(StatusCode::BAD_REQUEST, "Unknown variant");
    }
    let Some(cart) = state.carts.get_mut(&body.cart_id) else {
        return failure(StatusCode::NOT_FOUND, "Cart not found");
    };

    if let Some(line) = cart.lines.iter_mut().find(|l| l.variant_id == body.variant_id) {
        line.quantity += body.quantity;
    } else {
        cart.next_line += 1;
        cart.lines.push(FakeLine {
            id: format!("{}-line-{}", body.cart_id, cart.next_line),
            variant_id: body.variant_id,
            quantity: body.quantity,
        });
    }
    Json(json!({ "success": true })).into_response()
}

async fn update_lines(State(state): State<Shared>, Json(body): Json<UpdateBody>) -> Response {
    let mut guard = lock(&state);
    let state = &mut *guard;
    state.calls.update += 1;

    if let Some(message) = &state.rejected {
        return failure(StatusCode::BAD_REQUEST, message);
    }
    let Some(cart) = state.carts.get_mut(&body.cart_id) else {
        return failure(StatusCode::NOT_FOUND, "Cart not found");
    };
    for update in body.lines {
        if let Some(line) = cart.lines.iter_mut().find(|l| l.id == update.id) {
            line.quantity = update.quantity;
        }
    }
    cart.lines.retain(|l| l.quantity > 0);
    cart_reply(state, &body.cart_id)
}

async fn remove_lines(State(state): State<Shared>, Json(body): Json<RemoveBody>) -> Response {
    let mut guard = lock(&state);
    let state = &mut *guard;
    state.calls.remove += 1;

    if let Some(message) = &state.rejected {
        return failure(StatusCode::BAD_REQUEST, message);
    }
    let Some(cart) = state.carts.get_mut(&body.cart_id) else {
        return failure(StatusCode::NOT_FOUND, "Cart not found");
    };
    cart.lines.retain(|l| !body.line_ids.contains(&l.id));
    cart_reply(state, &body.cart_id)
}

async fn inventory(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.calls.inventory += 1;
    let products: Vec<Value> = state.products.iter().map(FakeProduct::to_json).collect();
    Json(json!({ "success": true, "products": products })).into_response()
}

async fn product(State(state): State<Shared>, Path(handle): Path<String>) -> Response {
    let mut state = lock(&state);
    state.calls.product += 1;
    match state.products.iter().find(|p| p.handle == handle) {
        Some(product) => Json(json!({ "success": true, "product": product.to_json() })).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Product not found"),
    }
}

/// In-process stand-in for the commerce backend routes.
#[derive(Clone)]
pub struct FakeBackend {
    state: Shared,
    pub url: String,
}

impl FakeBackend {
    /// Start the fake backend on an ephemeral port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let url = format!("http://{}", listener.local_addr().expect("No local address"));

        let state = Arc::new(Mutex::new(BackendState {
            base_url: url.clone(),
            products: default_catalog(),
            carts: HashMap::new(),
            next_cart: 0,
            calls: Calls::default(),
            rejected: None,
        }));

        let router = Router::new()
            .route("/api/cart/create", post(create_cart))
            .route("/api/cart/get", post(get_cart))
            .route("/api/cart/add", post(add_line))
            .route("/api/cart/update", post(update_lines))
            .route("/api/cart/remove", post(remove_lines))
            .route("/api/inventory", get(inventory))
            .route("/api/product/{handle}", get(product))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Fake backend failed");
        });

        Self { state, url }
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Calls {
        lock(&self.state).calls
    }

    /// IDs of every cart created so far.
    #[must_use]
    pub fn cart_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.state).carts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// `(line id, quantity)` pairs of a cart.
    #[must_use]
    pub fn lines(&self, cart_id: &str) -> Vec<(String, u64)> {
        lock(&self.state)
            .carts
            .get(cart_id)
            .map(|cart| {
                cart.lines
                    .iter()
                    .map(|l| (l.id.clone(), l.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget a cart, as the platform does when one expires.
    pub fn expire(&self, cart_id: &str) {
        lock(&self.state).carts.remove(cart_id);
    }

    /// Refuse every cart mutation with `message`.
    pub fn reject_mutations(&self, message: &str) {
        lock(&self.state).rejected = Some(message.to_string());
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running storefront wired to a fresh fake backend.
pub struct TestContext {
    pub backend: FakeBackend,
    pub storefront_url: String,
    /// Cookie-holding client that does not follow redirects.
    pub client: Client,
}

impl TestContext {
    pub async fn new() -> Self {
        let backend = FakeBackend::start().await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr: SocketAddr = listener.local_addr().expect("No local address");
        let storefront_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: storefront_url.clone(),
            commerce: CommerceConfig::with_url(&backend.url).expect("Invalid backend URL"),
            store: StoreProfile::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let app = meeple_storefront::app(AppState::new(config));

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Storefront failed");
        });

        Self {
            backend,
            storefront_url,
            client: new_client(),
        }
    }

    /// Absolute storefront URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// GET a page and return its status and body.
    pub async fn get_page(&self, path: &str) -> (StatusCode, String) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        let status = resp.status();
        (status, resp.text().await.expect("Failed to read body"))
    }
}

/// A fresh cookie-holding client (a new visitor).
#[must_use]
pub fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}
