//! Meeple Core - Shared domain types.
//!
//! This crate provides the types used by every Meeple component:
//! - `storefront` - Public-facing web storefront
//! - `cli` - Terminal client for browsing and managing a cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The commerce platform owns carts and inventory; these types are
//! the validated projections of what it returns.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, carts, and products
//! - [`catalog`] - Client-side sorting and presentation of the product listing
//! - [`gallery`] - Cyclic image gallery navigation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod gallery;
pub mod types;

pub use catalog::{SortKey, SortOrder, ViewMode, clamp_quantity, sort_products};
pub use gallery::Gallery;
pub use types::*;
