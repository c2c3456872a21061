//! File-backed cart ID store.
//!
//! The terminal equivalent of the browser session: the cart ID lives in a
//! small text file so consecutive invocations share one cart.

use std::io::ErrorKind;
use std::path::PathBuf;

use meeple_core::CartId;
use meeple_storefront::cart::{CartIdStore, StoreError};

/// Cart ID persisted as the whole contents of a file.
#[derive(Debug, Clone)]
pub struct FileCartIdStore {
    path: PathBuf,
}

impl FileCartIdStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartIdStore for FileCartIdStore {
    async fn load_cart_id(&self) -> Result<Option<CartId>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| CartId::new(id)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_cart_id(&self, id: &CartId) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, format!("{id}\n")).await?;
        Ok(())
    }
}
