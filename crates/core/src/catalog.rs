//! Client-side presentation of the product listing.
//!
//! The listing is fetched once; sorting and grid/list switching happen over
//! the fetched collection without another platform round-trip.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::Product;

/// Field the listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Price,
}

impl SortKey {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Listing presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

/// Compare two titles the way a reader expects.
///
/// Titles compare first on their base letters, ignoring case and accents
/// ("Éclipse" sorts with "Eclipse", "catan" with "Catan"). Accents then
/// case break ties, and the raw strings last, so distinct titles never
/// compare equal.
#[must_use]
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a, true)
        .cmp(collation_key(b, true))
        .then_with(|| collation_key(a, false).cmp(collation_key(b, false)))
        .then_with(|| a.cmp(b))
}

/// Lowercased, decomposed characters of a title, without combining marks
/// when `strip_marks` is set.
fn collation_key(title: &str, strip_marks: bool) -> impl Iterator<Item = char> + '_ {
    title
        .nfd()
        .filter(move |c| !(strip_marks && is_combining_mark(*c)))
        .flat_map(char::to_lowercase)
}

/// Sort products by the given key and direction.
///
/// Descending order is the exact reverse comparator, so for distinct titles
/// a descending name sort is the reversed ascending one. Equal prices keep
/// their platform order in both directions.
#[must_use]
pub fn sort_products(products: &[Product], key: SortKey, order: SortOrder) -> Vec<Product> {
    let mut sorted = products.to_vec();
    sorted.sort_by(|a, b| {
        let comparison = match key {
            SortKey::Name => compare_titles(&a.title, &b.title),
            SortKey::Price => a.price.amount.cmp(&b.price.amount),
        };
        match order {
            SortOrder::Asc => comparison,
            SortOrder::Desc => comparison.reverse(),
        }
    });
    sorted
}

/// Clamp a requested add-to-cart quantity to what the product can supply.
///
/// Returns `None` when nothing can be added (out of stock).
#[must_use]
pub fn clamp_quantity(requested: u32, available: u32) -> Option<u32> {
    if available == 0 {
        return None;
    }
    Some(requested.clamp(1, available))
}
