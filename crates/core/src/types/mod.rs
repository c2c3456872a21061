//! Core types for Meeple.
//!
//! This module provides type-safe wrappers for the commerce platform's
//! domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartLine, CartSummary, Merchandise};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{Image, Product};
