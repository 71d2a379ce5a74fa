//! Cart aggregate store: one mutable pending cart per (customer, project).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::ProjectId;
use domain::{Cart, CartItem, Money, validate_cart_contents};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Trait for cart persistence.
///
/// Carts are keyed by (customer email, project id). There is no history:
/// settlement deletes the cart outright and the sale record is the
/// durable receipt.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the pending cart for the pair, creating an empty one when
    /// none exists. Idempotent; the boolean is true when a cart was
    /// created by this call.
    async fn get_or_create(&self, email: &str, project_id: &ProjectId) -> Result<(Cart, bool)>;

    /// Returns the pending cart, if any.
    async fn find_pending(&self, email: &str, project_id: &ProjectId) -> Result<Option<Cart>>;

    /// Validates and overwrites the pending cart's items and total.
    ///
    /// On validation failure the stored cart is left untouched. Fails
    /// with `CartNotFound` when no pending cart exists.
    async fn replace_contents(
        &self,
        email: &str,
        project_id: &ProjectId,
        items: Vec<CartItem>,
        total: Money,
    ) -> Result<Cart>;

    /// Permanently deletes the pending cart. Returns true when a cart
    /// existed.
    async fn delete_pending(&self, email: &str, project_id: &ProjectId) -> Result<bool>;
}

type CartKey = (String, String);

fn key(email: &str, project_id: &ProjectId) -> CartKey {
    (email.to_string(), project_id.as_str().to_string())
}

/// In-memory cart store backing tests and the default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<CartKey, Cart>>>,
    fail_on_delete: Arc<AtomicBool>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pending carts.
    pub async fn cart_count(&self) -> usize {
        self.carts.read().await.len()
    }

    /// Configures the store to fail deletes, for exercising the
    /// settlement compensation path.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.fail_on_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_or_create(&self, email: &str, project_id: &ProjectId) -> Result<(Cart, bool)> {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get(&key(email, project_id)) {
            return Ok((cart.clone(), false));
        }
        let cart = Cart::empty(email, project_id.clone());
        carts.insert(key(email, project_id), cart.clone());
        Ok((cart, true))
    }

    async fn find_pending(&self, email: &str, project_id: &ProjectId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&key(email, project_id)).cloned())
    }

    async fn replace_contents(
        &self,
        email: &str,
        project_id: &ProjectId,
        items: Vec<CartItem>,
        total: Money,
    ) -> Result<Cart> {
        validate_cart_contents(&items, total)?;

        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(&key(email, project_id))
            .ok_or(StoreError::CartNotFound)?;
        cart.items = items;
        cart.total = total;
        Ok(cart.clone())
    }

    async fn delete_pending(&self, email: &str, project_id: &ProjectId) -> Result<bool> {
        if self.fail_on_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cart store unavailable".to_string()));
        }
        Ok(self.carts.write().await.remove(&key(email, project_id)).is_some())
    }
}
