//! CLI command implementations.

pub mod cart;
pub mod catalog;

use std::path::PathBuf;

use meeple_storefront::cart::{CartEvents, CartSession, InFlightLines};
use meeple_storefront::commerce::CommerceClient;
use meeple_storefront::config::{CommerceConfig, ConfigError, StoreProfile};

use crate::store::FileCartIdStore;

/// Everything a command needs: the backend client, store profile, and where
/// the cart ID lives.
pub struct Context {
    pub commerce: CommerceClient,
    pub store: StoreProfile,
    pub cart_file: PathBuf,
}

impl Context {
    /// Build the context from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend URL or store profile is invalid.
    pub fn from_env(cart_file: PathBuf) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let commerce = CommerceClient::new(&CommerceConfig::from_env()?);
        Ok(Self {
            commerce,
            store: StoreProfile::from_env()?,
            cart_file,
        })
    }

    /// Cart session for this invocation.
    #[must_use]
    pub fn cart_session(&self) -> CartSession<CommerceClient, FileCartIdStore> {
        CartSession::new(
            self.commerce.clone(),
            FileCartIdStore::new(&self.cart_file),
            CartEvents::new(),
            InFlightLines::new(),
        )
    }
}
