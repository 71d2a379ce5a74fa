//! Checkout attempt instance, rebuilt from its journaled events.

use common::{AttemptId, ProjectId};
use domain::SaleOrigin;
use serde::{Deserialize, Serialize};

use crate::events::AttemptEvent;
use crate::state::AttemptState;

/// A journaled settlement attempt.
///
/// Tracks completed steps and the context compensation needs: the sale
/// number (to mark the sale failed) and every stock decrement applied so
/// far (to restore each one). Replaying the journal reconstructs an
/// attempt exactly, which is what makes a crashed attempt reconcilable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    id: Option<AttemptId>,
    project_id: Option<ProjectId>,
    origin: Option<SaleOrigin>,
    customer_email: Option<String>,
    state: AttemptState,
    completed_steps: Vec<String>,
    /// Sale number allocated by the persist_sale step.
    sale_number: Option<u64>,
    /// Decrements applied and not yet restored, in application order.
    decremented: Vec<(String, u32)>,
    /// Reason for failure, if any.
    failure_reason: Option<String>,
}

impl CheckoutAttempt {
    /// Applies one journaled event to the attempt.
    pub fn apply(&mut self, event: AttemptEvent) {
        match event {
            AttemptEvent::AttemptStarted(data) => {
                self.id = Some(data.attempt_id);
                self.project_id = Some(data.project_id);
                self.origin = Some(data.origin);
                self.customer_email = data.customer_email;
                self.state = AttemptState::Running;
            }
            AttemptEvent::StepStarted(_) => {}
            AttemptEvent::StepCompleted(data) => {
                self.completed_steps.push(data.step_name);
                if let Some(number) = data.sale_number {
                    self.sale_number = Some(number);
                }
            }
            AttemptEvent::StockDecremented(data) => {
                self.decremented.push((data.product_id, data.quantity));
            }
            AttemptEvent::StepFailed(data) => {
                self.failure_reason = Some(data.error);
            }
            AttemptEvent::CompensationStarted(_) => {
                self.state = AttemptState::Compensating;
            }
            AttemptEvent::StockRestored(data) => {
                if let Some(pos) = self
                    .decremented
                    .iter()
                    .rposition(|(id, qty)| *id == data.product_id && *qty == data.quantity)
                {
                    self.decremented.remove(pos);
                }
            }
            AttemptEvent::CompensationStepCompleted(_) => {}
            AttemptEvent::CompensationStepFailed(_) => {
                // Compensation failures are journaled but don't stop the chain
            }
            AttemptEvent::AttemptCompleted(_) => {
                self.state = AttemptState::Completed;
            }
            AttemptEvent::AttemptFailed(data) => {
                self.state = AttemptState::Failed;
                self.failure_reason = Some(data.reason);
            }
        }
    }

    /// Returns the attempt id, once started.
    pub fn id(&self) -> Option<AttemptId> {
        self.id
    }

    /// Returns the project the attempt settles against.
    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    /// Returns the channel that triggered the attempt.
    pub fn origin(&self) -> Option<SaleOrigin> {
        self.origin
    }

    /// Returns the customer email, when known.
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    /// Returns the attempt state.
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Returns the list of completed step names.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Returns the allocated sale number, if the sale was written.
    pub fn sale_number(&self) -> Option<u64> {
        self.sale_number
    }

    /// Returns the stock decrements not yet restored.
    pub fn decremented(&self) -> &[(String, u32)] {
        &self.decremented
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement;

    fn started(attempt_id: AttemptId) -> AttemptEvent {
        AttemptEvent::attempt_started(
            attempt_id,
            ProjectId::new("1"),
            SaleOrigin::Web,
            Some("ana@example.com".to_string()),
        )
    }

    #[test]
    fn default_attempt_is_not_started() {
        let attempt = CheckoutAttempt::default();
        assert!(attempt.id().is_none());
        assert_eq!(attempt.state(), AttemptState::NotStarted);
        assert!(attempt.completed_steps().is_empty());
    }

    #[test]
    fn apply_attempt_started() {
        let mut attempt = CheckoutAttempt::default();
        let id = AttemptId::new();
        attempt.apply(started(id));

        assert_eq!(attempt.id(), Some(id));
        assert_eq!(attempt.project_id(), Some(&ProjectId::new("1")));
        assert_eq!(attempt.origin(), Some(SaleOrigin::Web));
        assert_eq!(attempt.customer_email(), Some("ana@example.com"));
        assert_eq!(attempt.state(), AttemptState::Running);
    }

    #[test]
    fn apply_full_settlement_lifecycle() {
        let mut attempt = CheckoutAttempt::default();
        attempt.apply(started(AttemptId::new()));

        attempt.apply(AttemptEvent::step_started(settlement::STEP_PERSIST_SALE));
        attempt.apply(AttemptEvent::step_completed(
            settlement::STEP_PERSIST_SALE,
            Some(4),
        ));
        assert_eq!(attempt.sale_number(), Some(4));

        attempt.apply(AttemptEvent::step_started(settlement::STEP_DECREMENT_STOCK));
        attempt.apply(AttemptEvent::stock_decremented("P1", 2, 3));
        attempt.apply(AttemptEvent::stock_decremented("P2", 1, 0));
        attempt.apply(AttemptEvent::step_completed(
            settlement::STEP_DECREMENT_STOCK,
            None,
        ));
        assert_eq!(
            attempt.decremented(),
            &[("P1".to_string(), 2), ("P2".to_string(), 1)]
        );

        attempt.apply(AttemptEvent::step_started(settlement::STEP_CLEAR_CART));
        attempt.apply(AttemptEvent::step_completed(settlement::STEP_CLEAR_CART, None));

        attempt.apply(AttemptEvent::attempt_completed());
        assert_eq!(attempt.state(), AttemptState::Completed);
        assert_eq!(
            attempt.completed_steps(),
            &[
                settlement::STEP_PERSIST_SALE,
                settlement::STEP_DECREMENT_STOCK,
                settlement::STEP_CLEAR_CART,
            ]
        );
    }

    #[test]
    fn apply_failure_and_compensation() {
        let mut attempt = CheckoutAttempt::default();
        attempt.apply(started(AttemptId::new()));
        attempt.apply(AttemptEvent::step_started(settlement::STEP_PERSIST_SALE));
        attempt.apply(AttemptEvent::step_completed(
            settlement::STEP_PERSIST_SALE,
            Some(9),
        ));
        attempt.apply(AttemptEvent::step_started(settlement::STEP_DECREMENT_STOCK));
        attempt.apply(AttemptEvent::stock_decremented("P1", 1, 0));
        attempt.apply(AttemptEvent::step_failed(
            settlement::STEP_DECREMENT_STOCK,
            "Stock insuficiente para el producto: P2",
        ));

        attempt.apply(AttemptEvent::compensation_started(
            settlement::STEP_DECREMENT_STOCK,
        ));
        assert_eq!(attempt.state(), AttemptState::Compensating);

        attempt.apply(AttemptEvent::stock_restored("P1", 1, 1));
        assert!(attempt.decremented().is_empty());

        attempt.apply(AttemptEvent::compensation_step_completed(
            settlement::STEP_PERSIST_SALE,
        ));
        attempt.apply(AttemptEvent::attempt_failed(
            "Stock insuficiente para el producto: P2",
        ));
        assert_eq!(attempt.state(), AttemptState::Failed);
        assert!(attempt.state().is_terminal());
        assert_eq!(
            attempt.failure_reason(),
            Some("Stock insuficiente para el producto: P2")
        );
    }

    #[test]
    fn compensation_step_failure_keeps_compensating() {
        let mut attempt = CheckoutAttempt::default();
        attempt.apply(started(AttemptId::new()));
        attempt.apply(AttemptEvent::step_started(settlement::STEP_PERSIST_SALE));
        attempt.apply(AttemptEvent::step_failed(settlement::STEP_PERSIST_SALE, "error"));
        attempt.apply(AttemptEvent::compensation_started(settlement::STEP_PERSIST_SALE));

        attempt.apply(AttemptEvent::compensation_step_failed(
            settlement::STEP_PERSIST_SALE,
            "store unavailable",
        ));
        assert_eq!(attempt.state(), AttemptState::Compensating);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut attempt = CheckoutAttempt::default();
        let id = AttemptId::new();
        attempt.apply(started(id));
        attempt.apply(AttemptEvent::step_started(settlement::STEP_PERSIST_SALE));
        attempt.apply(AttemptEvent::step_completed(
            settlement::STEP_PERSIST_SALE,
            Some(2),
        ));

        let json = serde_json::to_string(&attempt).unwrap();
        let back: CheckoutAttempt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), Some(id));
        assert_eq!(back.state(), AttemptState::Running);
        assert_eq!(back.sale_number(), Some(2));
    }
}
