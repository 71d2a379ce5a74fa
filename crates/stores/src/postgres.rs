//! PostgreSQL-backed attempt log.

use async_trait::async_trait;
use common::AttemptId;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::attempt::{AttemptLog, AttemptRecord};
use crate::error::{Result, StoreError};

/// Attempt journal persisted in PostgreSQL.
#[derive(Clone)]
pub struct PostgresAttemptLog {
    pool: PgPool,
}

impl PostgresAttemptLog {
    /// Creates a new PostgreSQL attempt log.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the journal schema if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_create_attempt_events.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<AttemptRecord> {
        Ok(AttemptRecord {
            attempt_id: AttemptId::from_uuid(row.try_get::<Uuid, _>("attempt_id")?),
            seq: row.try_get("seq")?,
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

#[async_trait]
impl AttemptLog for PostgresAttemptLog {
    async fn append(&self, record: AttemptRecord) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let tail: Option<i64> =
            sqlx::query_scalar("SELECT MAX(seq) FROM checkout_attempt_events WHERE attempt_id = $1")
                .bind(record.attempt_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        let expected = tail.unwrap_or(0) + 1;
        if record.seq != expected {
            return Err(StoreError::ConcurrencyConflict {
                attempt_id: record.attempt_id,
                expected,
                actual: record.seq,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO checkout_attempt_events (attempt_id, seq, event_type, payload, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.attempt_id.as_uuid())
        .bind(record.seq)
        .bind(&record.event_type)
        .bind(&record.payload)
        .bind(record.recorded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // A primary-key violation means another writer won the race.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("checkout_attempt_events_pkey")
            {
                return StoreError::ConcurrencyConflict {
                    attempt_id: record.attempt_id,
                    expected,
                    actual: record.seq,
                };
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        Ok(record.seq)
    }

    async fn records_for(&self, attempt_id: AttemptId) -> Result<Vec<AttemptRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT attempt_id, seq, event_type, payload, recorded_at
            FROM checkout_attempt_events
            WHERE attempt_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(attempt_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
