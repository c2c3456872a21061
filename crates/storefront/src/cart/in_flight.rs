//! Per-line submission tracking.
//!
//! Advisory only: it rejects a second submission for a line while the first
//! is outstanding, but does not order requests for different lines.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use meeple_core::{CartId, CartLineId};

type LineKey = (CartId, CartLineId);

/// Lines with a quantity change currently in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightLines {
    lines: Arc<Mutex<HashSet<LineKey>>>,
}

impl InFlightLines {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a line as submitting.
    ///
    /// Returns `None` if the line is already submitting. The mark is cleared
    /// when the returned guard drops, whether the request succeeded or not.
    #[must_use]
    pub fn try_begin(&self, cart_id: &CartId, line_id: &CartLineId) -> Option<InFlightGuard> {
        let key = (cart_id.clone(), line_id.clone());
        let inserted = self
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());

        inserted.then(|| InFlightGuard {
            lines: self.clone(),
            key,
        })
    }

    /// Whether a line is currently submitting.
    #[must_use]
    pub fn is_in_flight(&self, cart_id: &CartId, line_id: &CartLineId) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(cart_id.clone(), line_id.clone()))
    }
}

/// Clears a line's in-flight mark on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    lines: InFlightLines,
    key: LineKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.lines
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
