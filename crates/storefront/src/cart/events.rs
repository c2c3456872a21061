//! Cart change notifications.

use meeple_core::CartId;
use tokio::sync::broadcast;

/// Buffered events per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// A cart was replaced by a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    /// The cart that changed.
    pub cart_id: CartId,
    /// Sum of line quantities in the new snapshot.
    pub total_quantity: u32,
}

/// Broadcast channel of [`CartChanged`] events, shared by all sessions.
#[derive(Debug, Clone)]
pub struct CartEvents {
    sender: broadcast::Sender<CartChanged>,
}

impl CartEvents {
    /// Create a channel with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, event: CartChanged) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.sender.subscribe()
    }
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let events = CartEvents::new();
        let mut rx = events.subscribe();

        events.publish(CartChanged {
            cart_id: CartId::new("cart-1"),
            total_quantity: 3,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.cart_id.as_str(), "cart-1");
        assert_eq!(event.total_quantity, 3);
    }

    #[test]
    fn test_publish_without_subscribers() {
        CartEvents::default().publish(CartChanged {
            cart_id: CartId::new("cart-1"),
            total_quantity: 0,
        });
    }
}
