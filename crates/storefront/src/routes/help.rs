//! Help page route handler.
//!
//! FAQs and store policies. Each entry is collapsible; the set of open
//! entries lives in the `open` query parameter (comma-separated IDs) so the
//! page works without JavaScript.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::config::StoreProfile;
use crate::filters;
use crate::state::AppState;

/// A collapsible help entry.
#[derive(Clone)]
pub struct HelpEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub body: String,
    pub open: bool,
    /// Link that opens or closes this entry, keeping the others as they are.
    pub toggle_link: String,
}

/// Entry content before the open state is applied.
struct EntryContent {
    id: &'static str,
    title: &'static str,
    body: String,
}

fn faqs(store: &StoreProfile) -> Vec<EntryContent> {
    vec![
        EntryContent {
            id: "shipping-time",
            title: "How long does shipping take?",
            body: format!(
                "We typically ship within {}. Standard shipping takes {}. Shipping cost is ${:.2} for all orders.",
                store.processing_time, store.delivery_time, store.standard_shipping
            ),
        },
        EntryContent {
            id: "return-policy",
            title: "What is your return policy?",
            body: "We do not accept returns; all sales are final. If you receive a damaged or \
                   defective item, please contact us immediately and we'll work with you to \
                   resolve the issue."
                .to_string(),
        },
        EntryContent {
            id: "authentic",
            title: "Are your games authentic and new?",
            body: "Yes, all our games are authentic and brand new. We work directly with \
                   publishers to ensure you receive genuine products."
                .to_string(),
        },
        EntryContent {
            id: "contact",
            title: "How can I contact you?",
            body: format!(
                "You can reach us by email at {} or phone at {}. We typically respond within 24 hours.",
                store.email, store.phone
            ),
        },
    ]
}

fn policies(store: &StoreProfile) -> Vec<EntryContent> {
    vec![
        EntryContent {
            id: "returns",
            title: "No Returns Policy",
            body: "All sales are final. Damaged or defective items are the exception: contact \
                   us and we will make it right."
                .to_string(),
        },
        EntryContent {
            id: "shipping",
            title: "Shipping",
            body: format!(
                "We ship within {} and standard delivery takes {}. Shipping cost is ${:.2} for \
                 all orders. We ship within the {} only. You'll receive tracking information \
                 via email.",
                store.processing_time,
                store.delivery_time,
                store.standard_shipping,
                store.country
            ),
        },
        EntryContent {
            id: "privacy",
            title: "Privacy Policy",
            body: format!(
                "{} does not collect or store customer data. Payment and shipping details are \
                 handled entirely by our commerce platform at checkout.",
                store.name
            ),
        },
    ]
}

// =============================================================================
// Open set
// =============================================================================

/// Entry IDs currently expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenEntries(BTreeSet<String>);

impl OpenEntries {
    /// Parse the `open` query value. Empty segments are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// The set with `id` flipped.
    #[must_use]
    pub fn toggled(&self, id: &str) -> Self {
        let mut ids = self.0.clone();
        if !ids.remove(id) {
            ids.insert(id.to_string());
        }
        Self(ids)
    }

    /// Help page URL for this set, anchored at `id`.
    #[must_use]
    pub fn link(&self, id: &str) -> String {
        if self.0.is_empty() {
            return format!("/help#{id}");
        }
        let open = self.0.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        format!("/help?open={open}#{id}")
    }
}

fn entries(contents: Vec<EntryContent>, open: &OpenEntries) -> Vec<HelpEntry> {
    contents
        .into_iter()
        .map(|entry| HelpEntry {
            open: open.contains(entry.id),
            toggle_link: open.toggled(entry.id).link(entry.id),
            id: entry.id,
            title: entry.title,
            body: entry.body,
        })
        .collect()
}

// =============================================================================
// Handler
// =============================================================================

/// Help page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HelpQuery {
    pub open: Option<String>,
}

/// Help page template.
#[derive(Template, WebTemplate)]
#[template(path = "help.html")]
pub struct HelpTemplate {
    pub store_name: String,
    pub faqs: Vec<HelpEntry>,
    pub policies: Vec<HelpEntry>,
}

/// Display the help page.
#[instrument(skip(state))]
pub async fn help(State(state): State<AppState>, Query(query): Query<HelpQuery>) -> impl IntoResponse {
    let store = state.store();
    let open = OpenEntries::parse(query.open.as_deref());

    HelpTemplate {
        store_name: store.name.clone(),
        faqs: entries(faqs(store), &open),
        policies: entries(policies(store), &open),
    }
}
