//! Append-only journal of checkout-attempt events.
//!
//! Settlement spans stores with no shared commit, so each attempt writes
//! its step and compensation events here first. A crashed attempt can be
//! rebuilt from its records and reconciled by an operator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::AttemptId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, StoreError};

/// One journaled event of a checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// The attempt this record belongs to.
    pub attempt_id: AttemptId,

    /// Position in the attempt's journal, starting at 1.
    pub seq: i64,

    /// Event type tag for operators and queries.
    pub event_type: String,

    /// Serialized event payload.
    pub payload: serde_json::Value,

    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Builds a record from a serializable event.
    pub fn new<E: Serialize>(
        attempt_id: AttemptId,
        seq: i64,
        event_type: impl Into<String>,
        event: &E,
    ) -> Result<Self> {
        Ok(Self {
            attempt_id,
            seq,
            event_type: event_type.into(),
            payload: serde_json::to_value(event)?,
            recorded_at: Utc::now(),
        })
    }
}

/// Trait for attempt-journal persistence.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    /// Appends one record. `record.seq` must be exactly one past the
    /// journal's current tail; otherwise the append fails with
    /// `ConcurrencyConflict` and nothing is written.
    async fn append(&self, record: AttemptRecord) -> Result<i64>;

    /// Returns the attempt's records in seq order.
    async fn records_for(&self, attempt_id: AttemptId) -> Result<Vec<AttemptRecord>>;
}

/// In-memory attempt log for tests and the default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttemptLog {
    journals: Arc<RwLock<HashMap<AttemptId, Vec<AttemptRecord>>>>,
}

impl InMemoryAttemptLog {
    /// Creates a new empty attempt log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of attempts journaled.
    pub async fn attempt_count(&self) -> usize {
        self.journals.read().await.len()
    }
}

#[async_trait]
impl AttemptLog for InMemoryAttemptLog {
    async fn append(&self, record: AttemptRecord) -> Result<i64> {
        let mut journals = self.journals.write().await;
        let journal = journals.entry(record.attempt_id).or_default();
        let tail = journal.last().map(|r| r.seq).unwrap_or(0);
        if record.seq != tail + 1 {
            return Err(StoreError::ConcurrencyConflict {
                attempt_id: record.attempt_id,
                expected: tail + 1,
                actual: record.seq,
            });
        }
        let seq = record.seq;
        journal.push(record);
        Ok(seq)
    }

    async fn records_for(&self, attempt_id: AttemptId) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .journals
            .read()
            .await
            .get(&attempt_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempt_id: AttemptId, seq: i64) -> AttemptRecord {
        AttemptRecord::new(
            attempt_id,
            seq,
            "StepStarted",
            &serde_json::json!({"step": "persist_sale"}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let log = InMemoryAttemptLog::new();
        let id = AttemptId::new();

        log.append(record(id, 1)).await.unwrap();
        log.append(record(id, 2)).await.unwrap();

        let records = log.records_for(id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 1);
        assert_eq!(records[1].seq, 2);
    }

    #[tokio::test]
    async fn append_rejects_gap_in_sequence() {
        let log = InMemoryAttemptLog::new();
        let id = AttemptId::new();

        log.append(record(id, 1)).await.unwrap();
        let err = log.append(record(id, 3)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict {
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert_eq!(log.records_for(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_rejects_duplicate_seq() {
        let log = InMemoryAttemptLog::new();
        let id = AttemptId::new();

        log.append(record(id, 1)).await.unwrap();
        let err = log.append(record(id, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn unknown_attempt_has_empty_journal() {
        let log = InMemoryAttemptLog::new();
        assert!(log.records_for(AttemptId::new()).await.unwrap().is_empty());
    }
}
