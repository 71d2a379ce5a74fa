//! PostgreSQL integration tests for the attempt log.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p stores --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::AttemptId;
use serial_test::serial;
use sqlx::PgPool;
use stores::{AttemptLog, AttemptRecord, PostgresAttemptLog, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh log with its own pool and a clean table
async fn get_test_log() -> PostgresAttemptLog {
    let info = get_container_info().await;

    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    let log = PostgresAttemptLog::new(pool);
    log.migrate().await.unwrap();

    sqlx::query("TRUNCATE checkout_attempt_events")
        .execute(log.pool())
        .await
        .unwrap();

    log
}

fn record(attempt_id: AttemptId, seq: i64, event_type: &str) -> AttemptRecord {
    AttemptRecord::new(
        attempt_id,
        seq,
        event_type,
        &serde_json::json!({"step": "persist_sale"}),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn append_and_read_back() {
    let log = get_test_log().await;
    let id = AttemptId::new();

    log.append(record(id, 1, "AttemptStarted")).await.unwrap();
    log.append(record(id, 2, "StepStarted")).await.unwrap();

    let records = log.records_for(id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].seq, 1);
    assert_eq!(records[0].event_type, "AttemptStarted");
    assert_eq!(records[1].seq, 2);
}

#[tokio::test]
#[serial]
async fn append_rejects_out_of_order_seq() {
    let log = get_test_log().await;
    let id = AttemptId::new();

    log.append(record(id, 1, "AttemptStarted")).await.unwrap();
    let err = log.append(record(id, 3, "StepStarted")).await.unwrap_err();
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
#[serial]
async fn journals_are_isolated_per_attempt() {
    let log = get_test_log().await;
    let a = AttemptId::new();
    let b = AttemptId::new();

    log.append(record(a, 1, "AttemptStarted")).await.unwrap();
    log.append(record(b, 1, "AttemptStarted")).await.unwrap();
    log.append(record(b, 2, "StepStarted")).await.unwrap();

    assert_eq!(log.records_for(a).await.unwrap().len(), 1);
    assert_eq!(log.records_for(b).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn payload_roundtrips_as_jsonb() {
    let log = get_test_log().await;
    let id = AttemptId::new();

    let payload = serde_json::json!({
        "sale_number": 42,
        "decremented": [{"product_id": "P1", "quantity": 2}]
    });
    let mut rec = record(id, 1, "StepCompleted");
    rec.payload = payload.clone();
    log.append(rec).await.unwrap();

    let records = log.records_for(id).await.unwrap();
    assert_eq!(records[0].payload, payload);
}
