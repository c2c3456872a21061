//! Persistence of the cart identifier.
//!
//! The web storefront keeps it in the visitor's session and the CLI keeps it
//! in a file.

use std::future::Future;

use meeple_core::CartId;
use thiserror::Error;
use tower_sessions::Session;

use super::CART_ID_KEY;

/// Errors from a cart ID store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session backend failed.
    #[error("Session error: {0}")]
    Backend(String),

    /// Reading or writing the cart file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tower_sessions::session::Error> for StoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Where the current visitor's cart ID lives.
pub trait CartIdStore: Send + Sync {
    /// Read the persisted cart ID, if any.
    fn load_cart_id(&self) -> impl Future<Output = Result<Option<CartId>, StoreError>> + Send;

    /// Persist a cart ID, replacing any previous one.
    fn save_cart_id(&self, id: &CartId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl CartIdStore for Session {
    async fn load_cart_id(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.get::<CartId>(CART_ID_KEY).await?)
    }

    async fn save_cart_id(&self, id: &CartId) -> Result<(), StoreError> {
        self.insert(CART_ID_KEY, id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_session_store_uses_fixed_key() {
        let session = Session::new(None, Arc::new(tower_sessions::MemoryStore::default()), None);

        session.save_cart_id(&CartId::new("cart-3")).await.unwrap();

        let raw: Option<String> = session.get(CART_ID_KEY).await.unwrap();
        assert_eq!(raw.as_deref(), Some("cart-3"));
        assert_eq!(
            session.load_cart_id().await.unwrap(),
            Some(CartId::new("cart-3"))
        );
    }
}
