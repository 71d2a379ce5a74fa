//! Catalog store: product records and atomic per-product stock movements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProjectId;
use domain::Product;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Trait for catalog access and stock settlement.
///
/// `decrement_stock` is the settlement workflow's oversell guard: the
/// `stock >= quantity` check and the decrement happen under one
/// store-side critical section, so two concurrent checkouts cannot both
/// pass the check against the same units.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetches a product by id.
    async fn get(&self, product_id: &str) -> Result<Option<Product>>;

    /// Inserts or replaces a product record (admin/seed path).
    async fn upsert(&self, product: Product) -> Result<()>;

    /// Atomically decrements the project's stock for a product.
    ///
    /// Fails with `InsufficientStock` (leaving stock untouched) when
    /// fewer than `quantity` units are on hand. Returns the new stock.
    async fn decrement_stock(
        &self,
        product_id: &str,
        project_id: &ProjectId,
        quantity: u32,
    ) -> Result<i64>;

    /// Adds `quantity` units back to the project's stock for a product.
    ///
    /// Compensation and restock path. Returns the new stock.
    async fn restore_stock(
        &self,
        product_id: &str,
        project_id: &ProjectId,
        quantity: u32,
    ) -> Result<i64>;
}

/// In-memory catalog store.
///
/// The document store holding products is an external collaborator in
/// production; this implementation is the reference used by tests and
/// the default wiring. A single `RwLock` over the product map makes the
/// conditional decrement atomic per store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryCatalogStore {
    /// Creates a new empty catalog store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products stored.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
        Ok(())
    }

    async fn decrement_stock(
        &self,
        product_id: &str,
        project_id: &ProjectId,
        quantity: u32,
    ) -> Result<i64> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))?;
        let detail =
            product
                .project_detail_mut(project_id)
                .ok_or_else(|| StoreError::ProjectDetailNotFound {
                    product_id: product_id.to_string(),
                })?;

        let requested = i64::from(quantity);
        if detail.stock < requested {
            return Err(StoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available: detail.stock,
                requested,
            });
        }
        detail.stock -= requested;
        Ok(detail.stock)
    }

    async fn restore_stock(
        &self,
        product_id: &str,
        project_id: &ProjectId,
        quantity: u32,
    ) -> Result<i64> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))?;
        let detail =
            product
                .project_detail_mut(project_id)
                .ok_or_else(|| StoreError::ProjectDetailNotFound {
                    product_id: product_id.to_string(),
                })?;

        detail.stock += i64::from(quantity);
        Ok(detail.stock)
    }
}
