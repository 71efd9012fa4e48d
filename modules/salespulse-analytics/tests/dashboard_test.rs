//! AggregationEngine against the in-memory store.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use salespulse_analytics::{AggregationEngine, DashboardParams, DashboardQuery};
use salespulse_common::{NormalizedEvent, Platform, QueryError};
use salespulse_store::{MemoryRecordStore, RecordStore};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sale(platform: Platform, event_type: &str, tx: &str, product: &str, amount: &str) -> NormalizedEvent {
    NormalizedEvent::new(platform, event_type, json!({"id": tx}))
        .with_transaction_id(tx)
        .with_product(product)
        .with_amount(dec(amount))
}

#[tokio::test]
async fn dashboard_reflects_stored_events() {
    let store = Arc::new(MemoryRecordStore::new());

    store.set_clock(Utc.with_ymd_and_hms(2025, 5, 10, 14, 0, 0).unwrap());
    store
        .upsert(&sale(Platform::Braip, "sale_approved", "B1", "Curso", "100.00").with_commission(dec("20.00")))
        .await
        .unwrap();
    store
        .upsert(&sale(Platform::Kirvano, "abandoned_cart", "K1", "Planner", "300.00"))
        .await
        .unwrap();

    store.set_clock(Utc.with_ymd_and_hms(2025, 5, 12, 9, 0, 0).unwrap());
    store
        .upsert(&sale(Platform::Hubla, "sale_refunded", "H1", "Mentoria", "50.00"))
        .await
        .unwrap();

    let engine = AggregationEngine::new(store);
    let query = DashboardQuery::new(date("2025-05-10"), date("2025-05-12"), 10, None).unwrap();
    let payload = engine.compute(&query).await.unwrap();

    assert_eq!(payload.kpis.sales_value, dec("100.00"));
    assert_eq!(payload.kpis.total_sales, 1);
    assert_eq!(payload.kpis.abandoned_value, dec("300.00"));
    assert_eq!(payload.kpis.refunds_value, dec("50.00"));

    assert_eq!(payload.daily_trend.labels, vec!["2025-05-10", "2025-05-11", "2025-05-12"]);
    assert_eq!(payload.daily_trend.values, vec![dec("80.00"), dec("0"), dec("0")]);

    assert_eq!(payload.top_selling_products.labels, vec!["Curso"]);
    assert_eq!(payload.top_abandoned_products.labels, vec!["Planner"]);
    assert_eq!(payload.refund_analysis.labels, vec!["hubla"]);
    assert_eq!(payload.platform_analysis.chart_labels, vec!["braip", "hubla", "kirvano"]);
}

#[tokio::test]
async fn redelivered_transaction_counts_once() {
    let store = Arc::new(MemoryRecordStore::new());
    store.set_clock(Utc.with_ymd_and_hms(2025, 5, 10, 14, 0, 0).unwrap());
    store
        .upsert(&sale(Platform::Hubla, "sale_approved", "T1", "X", "100.00"))
        .await
        .unwrap();
    store
        .upsert(&sale(Platform::Hubla, "sale_approved", "T1", "X", "150.00"))
        .await
        .unwrap();

    let engine = AggregationEngine::new(store);
    let query = DashboardQuery::new(date("2025-05-10"), date("2025-05-10"), 10, None).unwrap();
    let payload = engine.compute(&query).await.unwrap();

    assert_eq!(payload.kpis.total_sales, 1);
    assert_eq!(payload.kpis.sales_value, dec("150.00"));
}

#[tokio::test]
async fn platform_filter_narrows_the_dataset() {
    let store = Arc::new(MemoryRecordStore::new());
    store.set_clock(Utc.with_ymd_and_hms(2025, 5, 10, 14, 0, 0).unwrap());
    store
        .upsert(&sale(Platform::Hubla, "sale_approved", "H1", "X", "10"))
        .await
        .unwrap();
    store
        .upsert(&sale(Platform::Cakto, "purchase_approved", "C1", "Y", "20"))
        .await
        .unwrap();

    let params = DashboardParams {
        start_date: Some("2025-05-10".into()),
        end_date: Some("2025-05-10".into()),
        top_n: None,
        platform: Some("cakto".into()),
    };
    let query = DashboardQuery::from_params(&params, date("2025-06-01")).unwrap();
    let payload = AggregationEngine::new(store).compute(&query).await.unwrap();

    assert_eq!(payload.kpis.sales_value, dec("20"));
    assert_eq!(payload.platform_analysis.chart_labels, vec!["cakto"]);
}

#[tokio::test]
async fn top_n_truncates_ten_products_to_three() {
    let store = Arc::new(MemoryRecordStore::new());
    store.set_clock(Utc.with_ymd_and_hms(2025, 5, 10, 14, 0, 0).unwrap());
    for i in 0..10 {
        // Product i sells i + 1 times.
        for n in 0..=i {
            store
                .upsert(&sale(
                    Platform::Kirvano,
                    "sale_approved",
                    &format!("P{i}-{n}"),
                    &format!("Product {i}"),
                    "10",
                ))
                .await
                .unwrap();
        }
    }

    let query = DashboardQuery::new(date("2025-05-10"), date("2025-05-10"), 3, None).unwrap();
    let payload = AggregationEngine::new(store).compute(&query).await.unwrap();

    assert_eq!(
        payload.top_selling_products.labels,
        vec!["Product 9", "Product 8", "Product 7"]
    );
    assert_eq!(payload.top_selling_products.values, vec![10, 9, 8]);
}

#[tokio::test]
async fn store_failure_is_an_error_not_an_empty_dashboard() {
    let store = Arc::new(MemoryRecordStore::new().failing());
    let query = DashboardQuery::new(date("2025-05-10"), date("2025-05-10"), 10, None).unwrap();

    let err = AggregationEngine::new(store).compute(&query).await.unwrap_err();
    assert!(matches!(err, QueryError::QueryFailed(_)));
}
