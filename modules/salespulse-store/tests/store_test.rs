//! Integration tests for PgRecordStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use std::sync::LazyLock;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use salespulse_common::{NormalizedEvent, Platform};
use salespulse_store::{EventFilter, PgRecordStore, RecordStore};
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

// Every test truncates the same table.
static DB_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Get a test database pool, or skip if no test DB is available. The guard
/// keeps other tests off the table until it is dropped.
async fn test_pool() -> Option<(MutexGuard<'static, ()>, PgPool)> {
    let guard = DB_LOCK.lock().await;
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;

    // Clean slate for each test
    sqlx::query("TRUNCATE webhooks RESTART IDENTITY")
        .execute(&pool)
        .await
        .ok()?;

    Some((guard, pool))
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn hubla_sale(tx: &str, amount: &str) -> NormalizedEvent {
    let mut event = NormalizedEvent::new(
        Platform::Hubla,
        "sale_approved",
        json!({"event": "sale_approved", "data": {"id": tx, "amount": amount}}),
    )
    .with_transaction_id(tx)
    .with_amount(dec(amount));
    event.customer_email = Some("ana@example.com".into());
    event.affiliate_email = Some("partner@example.com".into());
    event
}

// =========================================================================
// Upsert semantics
// =========================================================================

#[tokio::test]
async fn upsert_same_transaction_keeps_one_row_with_latest_fields() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let first = store.upsert(&hubla_sale("T1", "100.00")).await.unwrap();
    let second = store.upsert(&hubla_sale("T1", "150.00")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count().await.unwrap(), 1);

    let stored = store
        .find_by_transaction(Platform::Hubla, "T1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.event.amount, Some(dec("150.00")));
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn same_transaction_on_different_platforms_are_distinct() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let mut kirvano = hubla_sale("T1", "10.00");
    kirvano.platform = Platform::Kirvano;

    store.upsert(&hubla_sale("T1", "10.00")).await.unwrap();
    store.upsert(&kirvano).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn events_without_transaction_id_always_insert() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let event = NormalizedEvent::new(Platform::Hubla, "user_created", json!({"event": "user_created"}));
    store.upsert(&event).await.unwrap();
    store.upsert(&event).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn raw_capture_preserves_payload_verbatim() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let payload = json!({"weird": [1, 2, {"nested": true}], "unicode": "ação"});
    let id = store
        .capture_raw(&NormalizedEvent::raw_capture(Platform::Braip, payload.clone()))
        .await
        .unwrap();

    let rows = store.query(&EventFilter::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert!(!rows[0].normalized);
    assert_eq!(rows[0].event.raw_data, payload);
}

// =========================================================================
// Reads
// =========================================================================

#[tokio::test]
async fn query_filters_by_platform_and_range_in_ascending_order() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    store.upsert(&hubla_sale("A", "1.00")).await.unwrap();
    let mut braip = hubla_sale("B", "2.00");
    braip.platform = Platform::Braip;
    store.upsert(&braip).await.unwrap();
    store.upsert(&hubla_sale("C", "3.00")).await.unwrap();

    let now = Utc::now();
    let filter = EventFilter::new()
        .platform(Some(Platform::Hubla))
        .between(now - Duration::hours(1), now + Duration::hours(1));
    let rows = store.query(&filter).await.unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.event.transaction_id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["A".to_string(), "C".to_string()]);

    let past = EventFilter::new().between(now - Duration::days(3), now - Duration::days(2));
    assert!(store.query(&past).await.unwrap().is_empty());
}

#[tokio::test]
async fn email_lookups_use_exact_match() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    store.upsert(&hubla_sale("A", "1.00")).await.unwrap();
    store.upsert(&hubla_sale("B", "1.00")).await.unwrap();

    assert_eq!(store.find_by_customer_email("ana@example.com").await.unwrap().len(), 2);
    assert_eq!(store.find_by_affiliate_email("partner@example.com").await.unwrap().len(), 2);
    assert!(store.find_by_customer_email("ANA@example.com").await.unwrap().is_empty());
}

// =========================================================================
// Content Postgres would otherwise refuse
// =========================================================================

#[tokio::test]
async fn nul_characters_do_not_block_the_write() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let mut event = NormalizedEvent::new(
        Platform::Hubla,
        "sale_approved",
        json!({"data": {"id": "NUL", "customer": {"name": "a\u{0}b"}}}),
    )
    .with_transaction_id("NUL");
    event.customer_name = Some("a\u{0}b".into());

    store.upsert(&event).await.unwrap();
    store
        .capture_raw(&NormalizedEvent::raw_capture(Platform::Hubla, json!("body\u{0}text")))
        .await
        .unwrap();

    let stored = store
        .find_by_transaction(Platform::Hubla, "NUL")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.event.customer_name.as_deref(), Some("ab"));
    assert_eq!(stored.event.raw_data["data"]["customer"]["name"], "a\\u0000b");
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn largest_accepted_amount_fits_the_column() {
    let Some((_guard, pool)) = test_pool().await else {
        return;
    };
    let store = PgRecordStore::new(pool);

    let event = hubla_sale("BIG", "9999999999.99").with_commission(dec("9999999999.99"));
    store.upsert(&event).await.unwrap();

    let stored = store
        .find_by_transaction(Platform::Hubla, "BIG")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.event.amount, Some(dec("9999999999.99")));
}
