//! Pull-based import of Cakto orders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use salespulse_common::{AppConfig, NormalizedEvent, Platform};
use salespulse_store::RecordStore;

use crate::cakto::normalize_order;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Cakto sync is not configured (CAKTO_API_KEY unset)")]
    Disabled,

    #[error("Cakto API returned {status}")]
    Upstream { status: u16 },

    #[error("Cakto API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store unavailable: {0}")]
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub status: &'static str,
    pub fetched: usize,
    pub stored: usize,
    /// Orders that could not be mapped and were kept as raw captures.
    pub raw: usize,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    #[serde(default)]
    orders: Vec<Value>,
}

/// Client for `GET {base}/orders` with Bearer auth.
pub struct CaktoClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl CaktoClient {
    pub fn new(api_key: String, base_url: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// A client when `CAKTO_API_KEY` is configured, otherwise `Disabled`.
    pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Result<Self, SyncError> {
        let key = config.cakto_api_key.clone().ok_or(SyncError::Disabled)?;
        Ok(Self::new(key, config.cakto_api_url.clone(), client))
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Value>, SyncError> {
        let resp = self
            .client
            .get(format!("{}/orders", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SyncError::Upstream {
                status: resp.status().as_u16(),
            });
        }

        let body: OrdersResponse = resp.json().await?;
        Ok(body.orders)
    }
}

/// Normalize and store each order. Orders are upserted by id, so running the
/// sync twice does not duplicate rows. Unmappable orders are kept raw.
pub async fn import_orders(
    store: &dyn RecordStore,
    orders: Vec<Value>,
) -> Result<SyncReport, SyncError> {
    let fetched = orders.len();
    let mut stored = 0;
    let mut raw = 0;

    for order in orders {
        match normalize_order(&order) {
            Ok(event) => {
                store
                    .upsert(&event)
                    .await
                    .map_err(|e| SyncError::Store(e.to_string()))?;
                stored += 1;
            }
            Err(e) => {
                warn!(error = %e, "Cakto order could not be normalized, storing raw");
                store
                    .capture_raw(&NormalizedEvent::raw_capture(Platform::Cakto, order))
                    .await
                    .map_err(|e| SyncError::Store(e.to_string()))?;
                raw += 1;
            }
        }
    }

    info!(fetched, stored, raw, "Cakto order sync complete");
    Ok(SyncReport {
        status: "success",
        fetched,
        stored,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use salespulse_store::MemoryRecordStore;
    use serde_json::json;

    #[tokio::test]
    async fn import_is_idempotent_by_order_id() {
        let store = MemoryRecordStore::new();
        let orders = vec![
            json!({"id": "o1", "amount": 10, "status": "paid"}),
            json!({"id": "o2", "amount": 20, "status": "refunded"}),
            json!({"amount": 5}),
        ];

        let first = import_orders(&store, orders.clone()).await.unwrap();
        assert_eq!(
            first,
            SyncReport { status: "success", fetched: 3, stored: 2, raw: 1 }
        );

        import_orders(&store, orders).await.unwrap();
        // o1/o2 upserted in place; the id-less order is captured again.
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn store_failure_aborts_import() {
        let store = MemoryRecordStore::new().failing();
        let err = import_orders(&store, vec![json!({"id": "o1"})]).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
    }

    #[test]
    fn missing_key_disables_sync() {
        let config = AppConfig::default();
        assert!(matches!(
            CaktoClient::from_config(&config, reqwest::Client::new()),
            Err(SyncError::Disabled)
        ));
    }

    #[test]
    fn orders_response_tolerates_missing_list() {
        let body: OrdersResponse = serde_json::from_str("{}").unwrap();
        assert!(body.orders.is_empty());
    }
}
