//! Sale ledger store: append-mostly numbered sale records per project.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ProjectId;
use domain::{Money, Sale, SaleState};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// Trait for sale persistence and queries.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Allocates the next sale number for a project.
    ///
    /// The sequence is atomic per project and seeded from the highest
    /// stored number, replacing the racy max+1 scan. Numbers are
    /// monotonic and gap-tolerant: a failed settlement burns its number.
    async fn next_number(&self, project_id: &ProjectId) -> Result<u64>;

    /// Persists a sale record.
    async fn insert(&self, sale: Sale) -> Result<()>;

    /// Fetches a sale by project and number.
    async fn get(&self, project_id: &ProjectId, number: u64) -> Result<Option<Sale>>;

    /// Returns the project's sales, newest first.
    async fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<Sale>>;

    /// Returns the sales recorded for a customer email, newest first.
    async fn list_for_email(&self, email: &str) -> Result<Vec<Sale>>;

    /// Sum of totals over the project's collected sales (paid, ready for
    /// delivery, delivered).
    async fn paid_total(&self, project_id: &ProjectId) -> Result<Money>;

    /// Quantities sold per product since `since`, most sold first,
    /// truncated to `limit` entries.
    async fn top_products(
        &self,
        project_id: &ProjectId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, u64)>>;

    /// Marks a sale `Failed`; the compensating action when settlement
    /// cannot complete after the sale was written.
    async fn mark_failed(&self, project_id: &ProjectId, number: u64) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemorySaleState {
    sales: Vec<Sale>,
    sequences: HashMap<String, u64>,
}

/// In-memory sale store backing tests and the default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemorySaleStore {
    state: Arc<RwLock<InMemorySaleState>>,
}

impl InMemorySaleStore {
    /// Creates a new empty sale store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sales stored.
    pub async fn sale_count(&self) -> usize {
        self.state.read().await.sales.len()
    }
}

fn is_collected(state: SaleState) -> bool {
    matches!(
        state,
        SaleState::Paid | SaleState::ReadyForDelivery | SaleState::Delivered
    )
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn next_number(&self, project_id: &ProjectId) -> Result<u64> {
        let mut state = self.state.write().await;
        let seed = state
            .sales
            .iter()
            .filter(|s| &s.project_id == project_id)
            .map(|s| s.number)
            .max()
            .unwrap_or(0);
        let counter = state
            .sequences
            .entry(project_id.as_str().to_string())
            .or_insert(seed);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert(&self, sale: Sale) -> Result<()> {
        self.state.write().await.sales.push(sale);
        Ok(())
    }

    async fn get(&self, project_id: &ProjectId, number: u64) -> Result<Option<Sale>> {
        Ok(self
            .state
            .read()
            .await
            .sales
            .iter()
            .find(|s| &s.project_id == project_id && s.number == number)
            .cloned())
    }

    async fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .state
            .read()
            .await
            .sales
            .iter()
            .filter(|s| &s.project_id == project_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn list_for_email(&self, email: &str) -> Result<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .state
            .read()
            .await
            .sales
            .iter()
            .filter(|s| s.email.as_deref() == Some(email))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn paid_total(&self, project_id: &ProjectId) -> Result<Money> {
        Ok(self
            .state
            .read()
            .await
            .sales
            .iter()
            .filter(|s| &s.project_id == project_id && is_collected(s.state))
            .map(|s| s.total)
            .sum())
    }

    async fn top_products(
        &self,
        project_id: &ProjectId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, u64)>> {
        let state = self.state.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for sale in state
            .sales
            .iter()
            .filter(|s| &s.project_id == project_id && s.created_at >= since && is_collected(s.state))
        {
            for item in &sale.items {
                *counts.entry(item.product_id.clone()).or_default() += u64::from(item.quantity);
            }
        }
        let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn mark_failed(&self, project_id: &ProjectId, number: u64) -> Result<()> {
        let mut state = self.state.write().await;
        let sale = state
            .sales
            .iter_mut()
            .find(|s| &s.project_id == project_id && s.number == number)
            .ok_or_else(|| StoreError::SaleNotFound {
                project_id: project_id.clone(),
                number,
            })?;
        sale.state = SaleState::Failed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{PaymentType, SaleItem, SaleOrigin, invoice_code};

    fn sale(project: &str, number: u64, state: SaleState, cents: i64) -> Sale {
        let project_id = ProjectId::new(project);
        Sale {
            number,
            invoice_code: invoice_code(&project_id, number),
            client: None,
            email: Some("ana@example.com".to_string()),
            items: vec![SaleItem {
                product_id: "P1".to_string(),
                unit_price: Money::from_cents(cents),
                quantity: 1,
            }],
            total: Money::from_cents(cents),
            project_id,
            state,
            payment_type: PaymentType::gateway(),
            origin: SaleOrigin::Web,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn next_number_is_sequential_per_project() {
        let store = InMemorySaleStore::new();
        let p1 = ProjectId::new("1");
        let p2 = ProjectId::new("2");

        assert_eq!(store.next_number(&p1).await.unwrap(), 1);
        assert_eq!(store.next_number(&p1).await.unwrap(), 2);
        assert_eq!(store.next_number(&p2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn next_number_seeds_from_stored_sales() {
        let store = InMemorySaleStore::new();
        let p1 = ProjectId::new("1");
        store.insert(sale("1", 7, SaleState::Paid, 1000)).await.unwrap();

        assert_eq!(store.next_number(&p1).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn concurrent_number_allocation_never_collides() {
        let store = InMemorySaleStore::new();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.next_number(&ProjectId::new("1")).await.unwrap()
            }));
        }
        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=10).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn list_for_project_filters_and_orders_newest_first() {
        let store = InMemorySaleStore::new();
        let mut older = sale("1", 1, SaleState::Paid, 1000);
        older.created_at = Utc::now() - Duration::hours(1);
        store.insert(older).await.unwrap();
        store.insert(sale("1", 2, SaleState::Paid, 2000)).await.unwrap();
        store.insert(sale("2", 1, SaleState::Paid, 3000)).await.unwrap();

        let sales = store.list_for_project(&ProjectId::new("1")).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].number, 2);
    }

    #[tokio::test]
    async fn paid_total_ignores_failed_and_cancelled() {
        let store = InMemorySaleStore::new();
        store.insert(sale("1", 1, SaleState::Paid, 1000)).await.unwrap();
        store
            .insert(sale("1", 2, SaleState::ReadyForDelivery, 500))
            .await
            .unwrap();
        store.insert(sale("1", 3, SaleState::Failed, 9000)).await.unwrap();
        store.insert(sale("1", 4, SaleState::Cancelled, 9000)).await.unwrap();

        let total = store.paid_total(&ProjectId::new("1")).await.unwrap();
        assert_eq!(total, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn top_products_ranks_by_quantity() {
        let store = InMemorySaleStore::new();
        let mut s1 = sale("1", 1, SaleState::Paid, 1000);
        s1.items = vec![
            SaleItem {
                product_id: "P1".to_string(),
                unit_price: Money::from_cents(500),
                quantity: 5,
            },
            SaleItem {
                product_id: "P2".to_string(),
                unit_price: Money::from_cents(500),
                quantity: 1,
            },
        ];
        s1.total = Money::from_cents(3000);
        store.insert(s1).await.unwrap();

        let since = Utc::now() - Duration::days(30);
        let top = store.top_products(&ProjectId::new("1"), since, 4).await.unwrap();
        assert_eq!(top[0], ("P1".to_string(), 5));
        assert_eq!(top[1], ("P2".to_string(), 1));
    }

    #[tokio::test]
    async fn mark_failed_flips_state() {
        let store = InMemorySaleStore::new();
        store.insert(sale("1", 1, SaleState::Paid, 1000)).await.unwrap();

        store.mark_failed(&ProjectId::new("1"), 1).await.unwrap();
        let stored = store.get(&ProjectId::new("1"), 1).await.unwrap().unwrap();
        assert_eq!(stored.state, SaleState::Failed);
    }

    #[tokio::test]
    async fn mark_failed_requires_existing_sale() {
        let store = InMemorySaleStore::new();
        let err = store.mark_failed(&ProjectId::new("1"), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::SaleNotFound { .. }));
    }
}
