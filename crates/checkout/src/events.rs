//! Checkout attempt events, journaled through the attempt log.

use chrono::{DateTime, Utc};
use common::{AttemptId, ProjectId};
use domain::SaleOrigin;
use serde::{Deserialize, Serialize};

/// Events that can occur during a settlement attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AttemptEvent {
    /// Settlement started for a validated request.
    AttemptStarted(AttemptStartedData),

    /// A settlement step started execution.
    StepStarted(StepData),

    /// A settlement step completed successfully.
    StepCompleted(StepCompletedData),

    /// One line item's stock was decremented.
    StockDecremented(StockMovementData),

    /// A settlement step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// One line item's decrement was rolled back.
    StockRestored(StockMovementData),

    /// A compensation action completed successfully.
    CompensationStepCompleted(StepData),

    /// A compensation action failed (logged, compensation continues).
    CompensationStepFailed(StepFailedData),

    /// Attempt completed successfully.
    AttemptCompleted(AttemptCompletedData),

    /// Attempt failed after compensation.
    AttemptFailed(AttemptFailedData),
}

impl AttemptEvent {
    /// Returns the event type tag stored in the journal.
    pub fn event_type(&self) -> &'static str {
        match self {
            AttemptEvent::AttemptStarted(_) => "AttemptStarted",
            AttemptEvent::StepStarted(_) => "StepStarted",
            AttemptEvent::StepCompleted(_) => "StepCompleted",
            AttemptEvent::StockDecremented(_) => "StockDecremented",
            AttemptEvent::StepFailed(_) => "StepFailed",
            AttemptEvent::CompensationStarted(_) => "CompensationStarted",
            AttemptEvent::StockRestored(_) => "StockRestored",
            AttemptEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            AttemptEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            AttemptEvent::AttemptCompleted(_) => "AttemptCompleted",
            AttemptEvent::AttemptFailed(_) => "AttemptFailed",
        }
    }
}

/// Data for AttemptStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStartedData {
    /// The attempt instance.
    pub attempt_id: AttemptId,
    /// Project whose stock and sale sequence are touched.
    pub project_id: ProjectId,
    /// Channel that triggered the attempt.
    pub origin: SaleOrigin,
    /// Customer email, when known.
    pub customer_email: Option<String>,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
}

/// Data for step lifecycle events carrying only the step name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    /// The step name.
    pub step_name: String,
}

/// Data for StepCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedData {
    /// The step name.
    pub step_name: String,
    /// Sale number (set after the persist_sale step).
    pub sale_number: Option<u64>,
}

/// Data for stock movement events; the exact quantities compensation
/// must undo (or has undone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementData {
    /// The product whose stock moved.
    pub product_id: String,
    /// Units moved.
    pub quantity: u32,
    /// Stock remaining after the movement.
    pub remaining: i64,
}

/// Data for StepFailed and CompensationStepFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Error message describing the failure.
    pub error: String,
}

/// Data for CompensationStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step that triggered compensation.
    pub from_step: String,
}

/// Data for AttemptCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptCompletedData {
    /// When the attempt completed.
    pub completed_at: DateTime<Utc>,
}

/// Data for AttemptFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptFailedData {
    /// Reason for failure.
    pub reason: String,
    /// When the attempt failed.
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl AttemptEvent {
    /// Creates an AttemptStarted event.
    pub fn attempt_started(
        attempt_id: AttemptId,
        project_id: ProjectId,
        origin: SaleOrigin,
        customer_email: Option<String>,
    ) -> Self {
        AttemptEvent::AttemptStarted(AttemptStartedData {
            attempt_id,
            project_id,
            origin,
            customer_email,
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step_name: impl Into<String>) -> Self {
        AttemptEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(step_name: impl Into<String>, sale_number: Option<u64>) -> Self {
        AttemptEvent::StepCompleted(StepCompletedData {
            step_name: step_name.into(),
            sale_number,
        })
    }

    /// Creates a StockDecremented event.
    pub fn stock_decremented(product_id: impl Into<String>, quantity: u32, remaining: i64) -> Self {
        AttemptEvent::StockDecremented(StockMovementData {
            product_id: product_id.into(),
            quantity,
            remaining,
        })
    }

    /// Creates a StockRestored event.
    pub fn stock_restored(product_id: impl Into<String>, quantity: u32, remaining: i64) -> Self {
        AttemptEvent::StockRestored(StockMovementData {
            product_id: product_id.into(),
            quantity,
            remaining,
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        AttemptEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(from_step: impl Into<String>) -> Self {
        AttemptEvent::CompensationStarted(CompensationData {
            from_step: from_step.into(),
        })
    }

    /// Creates a CompensationStepCompleted event.
    pub fn compensation_step_completed(step_name: impl Into<String>) -> Self {
        AttemptEvent::CompensationStepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a CompensationStepFailed event.
    pub fn compensation_step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        AttemptEvent::CompensationStepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    /// Creates an AttemptCompleted event.
    pub fn attempt_completed() -> Self {
        AttemptEvent::AttemptCompleted(AttemptCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates an AttemptFailed event.
    pub fn attempt_failed(reason: impl Into<String>) -> Self {
        AttemptEvent::AttemptFailed(AttemptFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement;

    #[test]
    fn event_type_tags() {
        let attempt_id = AttemptId::new();

        assert_eq!(
            AttemptEvent::attempt_started(
                attempt_id,
                ProjectId::new("1"),
                SaleOrigin::Web,
                Some("ana@example.com".to_string()),
            )
            .event_type(),
            "AttemptStarted"
        );
        assert_eq!(
            AttemptEvent::step_started(settlement::STEP_PERSIST_SALE).event_type(),
            "StepStarted"
        );
        assert_eq!(
            AttemptEvent::step_completed(settlement::STEP_PERSIST_SALE, Some(4)).event_type(),
            "StepCompleted"
        );
        assert_eq!(
            AttemptEvent::stock_decremented("P1", 2, 3).event_type(),
            "StockDecremented"
        );
        assert_eq!(
            AttemptEvent::stock_restored("P1", 2, 5).event_type(),
            "StockRestored"
        );
        assert_eq!(
            AttemptEvent::step_failed(settlement::STEP_DECREMENT_STOCK, "sin stock").event_type(),
            "StepFailed"
        );
        assert_eq!(
            AttemptEvent::compensation_started(settlement::STEP_CLEAR_CART).event_type(),
            "CompensationStarted"
        );
        assert_eq!(AttemptEvent::attempt_completed().event_type(), "AttemptCompleted");
        assert_eq!(
            AttemptEvent::attempt_failed("paso fallido").event_type(),
            "AttemptFailed"
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let events = vec![
            AttemptEvent::attempt_started(
                AttemptId::new(),
                ProjectId::new("1"),
                SaleOrigin::InStore,
                None,
            ),
            AttemptEvent::step_started(settlement::STEP_PERSIST_SALE),
            AttemptEvent::step_completed(settlement::STEP_PERSIST_SALE, Some(12)),
            AttemptEvent::stock_decremented("P1", 2, 3),
            AttemptEvent::step_failed(settlement::STEP_DECREMENT_STOCK, "sin stock"),
            AttemptEvent::compensation_started(settlement::STEP_DECREMENT_STOCK),
            AttemptEvent::stock_restored("P1", 2, 5),
            AttemptEvent::compensation_step_completed(settlement::STEP_PERSIST_SALE),
            AttemptEvent::compensation_step_failed(settlement::STEP_PERSIST_SALE, "timeout"),
            AttemptEvent::attempt_completed(),
            AttemptEvent::attempt_failed("sin stock"),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: AttemptEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), back.event_type());
        }
    }

    #[test]
    fn step_completed_carries_sale_number() {
        let event = AttemptEvent::step_completed(settlement::STEP_PERSIST_SALE, Some(7));
        let json = serde_json::to_string(&event).unwrap();
        let back: AttemptEvent = serde_json::from_str(&json).unwrap();

        if let AttemptEvent::StepCompleted(data) = back {
            assert_eq!(data.step_name, settlement::STEP_PERSIST_SALE);
            assert_eq!(data.sale_number, Some(7));
        } else {
            panic!("Expected StepCompleted event");
        }
    }
}
