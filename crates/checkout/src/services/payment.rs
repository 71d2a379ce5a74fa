//! Payment gateway trait and in-memory implementation.
//!
//! The gateway only creates payment intents; actual confirmation arrives
//! out-of-band and is not part of the settlement core.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;

use crate::error::{CheckoutError, Result};

/// A created payment intent the customer is redirected to.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// The gateway's preference/intent id.
    pub preference_id: String,
    /// URL the customer completes payment at.
    pub redirect_url: String,
}

/// Trait for payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for the given amount.
    async fn create_payment_intent(
        &self,
        amount: Money,
        description: &str,
        payer_email: &str,
    ) -> Result<PaymentIntent>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    intents: Vec<(String, i64)>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of intents created.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: Money,
        _description: &str,
        _payer_email: &str,
    ) -> Result<PaymentIntent> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(CheckoutError::Gateway("gateway unavailable".to_string()));
        }

        state.next_id += 1;
        let preference_id = format!("PREF-{:04}", state.next_id);
        state.intents.push((preference_id.clone(), amount.cents()));

        Ok(PaymentIntent {
            redirect_url: format!("https://pagos.example/checkout/{preference_id}"),
            preference_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_intent_returns_redirect() {
        let gateway = InMemoryPaymentGateway::new();
        let intent = gateway
            .create_payment_intent(Money::from_cents(2000), "Compra web", "ana@example.com")
            .await
            .unwrap();

        assert_eq!(intent.preference_id, "PREF-0001");
        assert!(intent.redirect_url.ends_with("PREF-0001"));
        assert_eq!(gateway.intent_count(), 1);
    }

    #[tokio::test]
    async fn fail_on_create() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_create(true);

        let result = gateway
            .create_payment_intent(Money::from_cents(2000), "Compra web", "ana@example.com")
            .await;
        assert!(result.is_err());
        assert_eq!(gateway.intent_count(), 0);
    }
}
