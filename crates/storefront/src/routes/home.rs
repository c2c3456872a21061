//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::state::AppState;

/// A selling point shown under the hero.
#[derive(Clone)]
pub struct Highlight {
    pub title: &'static str,
    pub body: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub store_name: String,
    pub tagline: String,
    pub highlights: Vec<Highlight>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();

    HomeTemplate {
        store_name: store.name.clone(),
        tagline: store.tagline.clone(),
        highlights: vec![
            Highlight {
                title: "Hand-Picked Games",
                body: "Every game on our shelves is one we love to play.".to_string(),
            },
            Highlight {
                title: "Fast & Careful Shipping",
                body: format!(
                    "Orders ship within {} and arrive in {}.",
                    store.processing_time, store.delivery_time
                ),
            },
            Highlight {
                title: "Personal Touch",
                body: format!("Questions? Write to us at {}.", store.email),
            },
        ],
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the commerce
/// backend.
pub async fn health() -> &'static str {
    "ok"
}
