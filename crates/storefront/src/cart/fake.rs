//! In-memory commerce backend and cart ID store for cart session tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use meeple_core::{
    Cart, CartId, CartLine, CartLineId, CurrencyCode, Merchandise, Price, Product, VariantId,
};
use rust_decimal::Decimal;

use super::{CartIdStore, StoreError};
use crate::commerce::{CommerceApi, CommerceError, LineUpdate};

/// Calls received, by operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub create: usize,
    pub get: usize,
    pub add: usize,
    pub update: usize,
    pub remove: usize,
}

#[derive(Debug, Default)]
struct State {
    carts: HashMap<CartId, Cart>,
    next_id: usize,
    calls: Calls,
    reject_mutations: Option<String>,
}

/// Every variant costs $10.00; line and cart totals are recomputed on every
/// change the way the platform would.
#[derive(Debug, Clone, Default)]
pub struct FakeCommerce {
    state: Arc<Mutex<State>>,
}

#[allow(clippy::unwrap_used)]
impl FakeCommerce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    /// Forget a cart, as if it expired on the platform.
    pub fn expire(&self, id: &CartId) {
        self.state.lock().unwrap().carts.remove(id);
    }

    /// Make add/update/remove answer `success: false` with this message.
    pub fn reject_mutations(&self, message: &str) {
        self.state.lock().unwrap().reject_mutations = Some(message.to_string());
    }

    pub fn cart(&self, id: &CartId) -> Option<Cart> {
        self.state.lock().unwrap().carts.get(id).cloned()
    }

    fn unit_price() -> Price {
        Price::new(Decimal::new(1000, 2), CurrencyCode::USD)
    }

    fn recompute(cart: &mut Cart) {
        cart.lines.retain(|line| line.quantity > 0);
        for line in &mut cart.lines {
            line.total = Price::new(
                line.merchandise.price.amount * Decimal::from(line.quantity),
                CurrencyCode::USD,
            );
        }
        cart.total_quantity = cart.line_quantity();
        cart.estimated_total = Price::new(
            cart.lines.iter().map(|line| line.total.amount).sum(),
            CurrencyCode::USD,
        );
    }

    fn mutate(
        &self,
        cart_id: &CartId,
        change: impl FnOnce(&mut Cart),
    ) -> Result<Cart, CommerceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.reject_mutations.clone() {
            return Err(CommerceError::Rejected(message));
        }
        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| CommerceError::Rejected("Cart not found".to_string()))?;
        change(cart);
        Self::recompute(cart);
        Ok(cart.clone())
    }
}

#[allow(clippy::unwrap_used)]
impl CommerceApi for FakeCommerce {
    async fn create_cart(&self) -> Result<Cart, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;
        state.next_id += 1;

        let id = CartId::new(format!("cart-{}", state.next_id));
        let cart = Cart {
            checkout_url: format!("https://shop.example/checkout/{id}"),
            id: id.clone(),
            total_quantity: 0,
            estimated_total: Price::zero(CurrencyCode::USD),
            lines: Vec::new(),
        };
        state.carts.insert(id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.calls.get += 1;
        Ok(state.carts.get(cart_id).cloned())
    }

    async fn add_line(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<(), CommerceError> {
        self.state.lock().unwrap().calls.add += 1;
        self.mutate(cart_id, |cart| {
            if let Some(line) = cart
                .lines
                .iter_mut()
                .find(|line| &line.merchandise.id == variant_id)
            {
                line.quantity += quantity;
                return;
            }
            let n = cart.lines.len() + 1;
            cart.lines.push(CartLine {
                id: CartLineId::new(format!("{cart_id}-line-{n}")),
                quantity,
                merchandise: Merchandise {
                    id: variant_id.clone(),
                    title: "Default Title".to_string(),
                    product_title: format!("Game {variant_id}"),
                    product_handle: format!("game-{variant_id}"),
                    price: Self::unit_price(),
                    image: None,
                },
                total: Self::unit_price(),
            });
        })?;
        Ok(())
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[LineUpdate],
    ) -> Result<Cart, CommerceError> {
        self.state.lock().unwrap().calls.update += 1;
        self.mutate(cart_id, |cart| {
            for update in lines {
                if let Some(line) = cart.lines.iter_mut().find(|line| line.id == update.id) {
                    line.quantity = update.quantity;
                }
            }
        })
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, CommerceError> {
        self.state.lock().unwrap().calls.remove += 1;
        self.mutate(cart_id, |cart| {
            cart.lines.retain(|line| !line_ids.contains(&line.id));
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(Vec::new())
    }

    async fn get_product(&self, handle: &str) -> Result<Product, CommerceError> {
        Err(CommerceError::NotFound(handle.to_string()))
    }
}

/// In-memory cart ID store, shared between clones.
///
/// Counts writes so tests can check that the ID is persisted only when a
/// cart is created.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartIdStore {
    id: Arc<Mutex<Option<CartId>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryCartIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: CartId) -> Self {
        Self {
            id: Arc::new(Mutex::new(Some(id))),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `save_cart_id` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[allow(clippy::unwrap_used)]
impl CartIdStore for MemoryCartIdStore {
    async fn load_cart_id(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.id.lock().unwrap().clone())
    }

    async fn save_cart_id(&self, id: &CartId) -> Result<(), StoreError> {
        *self.id.lock().unwrap() = Some(id.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryCartIdStore::new();
        assert!(store.load_cart_id().await.unwrap().is_none());

        store.save_cart_id(&CartId::new("cart-9")).await.unwrap();
        let clone = store.clone();
        assert_eq!(
            clone.load_cart_id().await.unwrap(),
            Some(CartId::new("cart-9"))
        );
        assert_eq!(store.writes(), 1);
    }
}
