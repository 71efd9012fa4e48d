use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use tracing::{error, info, warn};

use salespulse_common::{
    AppConfig, IngestError, NormalizationError, NormalizedEvent, Platform, WebhookSecrets,
};
use salespulse_store::{RecordStore, StoreError, StoredId};

use crate::fields;
use crate::registry::AdapterRegistry;

/// Outcome of an accepted delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub id: StoredId,
    pub platform: Platform,
    /// False when the payload was stored as a raw capture.
    pub normalized: bool,
    pub event_type: String,
    pub transaction_id: Option<String>,
    pub normalization_error: Option<NormalizationError>,
}

/// Runs one delivery through verify, normalize and store.
///
/// Holds no mutable state. Concurrent deliveries only meet at the store,
/// whose unique `(platform, transaction_id)` constraint makes the upsert atomic.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<AdapterRegistry>,
    store: Arc<dyn RecordStore>,
    secrets: WebhookSecrets,
    timeout: Duration,
}

enum BoundedError {
    TimedOut,
    Failed(String),
}

impl Coordinator {
    pub fn new(registry: Arc<AdapterRegistry>, store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            registry,
            store,
            secrets: config.webhook_secrets.clone(),
            timeout: config.adapter_timeout,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn secrets(&self) -> &WebhookSecrets {
        &self.secrets
    }

    /// Ingest one delivery for the platform named by `hint`.
    ///
    /// Exactly one store write happens per `Ok`. Unknown platforms and failed
    /// authentication write nothing.
    pub async fn ingest(
        &self,
        hint: &str,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<Accepted, IngestError> {
        let adapter = self.registry.resolve(hint)?;
        let platform = adapter.platform();

        // Unset secret: fail closed.
        let Some(secret) = self.secrets.for_platform(platform).map(str::to_string) else {
            warn!(platform = %platform, "Rejected delivery: no webhook secret configured");
            return Err(IngestError::AuthenticationFailed(platform));
        };

        let verified = {
            let adapter = adapter.clone();
            let body = body.clone();
            let headers = headers.clone();
            self.run_bounded(move || adapter.verify(&body, &headers, &secret))
                .await
        };
        match verified {
            Ok(true) => {}
            Ok(false) => {
                warn!(platform = %platform, "Rejected delivery: authentication failed");
                return Err(IngestError::AuthenticationFailed(platform));
            }
            Err(BoundedError::TimedOut) => {
                warn!(platform = %platform, "Rejected delivery: verification timed out");
                return Err(IngestError::AuthenticationFailed(platform));
            }
            Err(BoundedError::Failed(e)) => {
                error!(platform = %platform, error = %e, "Rejected delivery: verification task failed");
                return Err(IngestError::AuthenticationFailed(platform));
            }
        }

        let normalized = {
            let adapter = adapter.clone();
            let body = body.clone();
            self.run_bounded(move || adapter.normalize(&body)).await
        };
        let normalized = match normalized {
            Ok(result) => result,
            Err(BoundedError::TimedOut) => Err(NormalizationError::Timeout),
            Err(BoundedError::Failed(e)) => Err(NormalizationError::AdapterFailed(e)),
        };

        match normalized {
            Ok(event) => {
                let id = self.store.upsert(&event).await.map_err(|e| store_failed(platform, e))?;
                info!(
                    platform = %platform,
                    id,
                    event_type = %event.event_type,
                    transaction_id = ?event.transaction_id,
                    "Delivery accepted"
                );
                Ok(Accepted {
                    id,
                    platform,
                    normalized: true,
                    event_type: event.event_type,
                    transaction_id: event.transaction_id,
                    normalization_error: None,
                })
            }
            Err(reason) => {
                let capture = NormalizedEvent::raw_capture(platform, fields::raw_payload(&body));
                let id = self
                    .store
                    .capture_raw(&capture)
                    .await
                    .map_err(|e| store_failed(platform, e))?;
                warn!(platform = %platform, id, error = %reason, "Delivery stored as raw capture");
                Ok(Accepted {
                    id,
                    platform,
                    normalized: false,
                    event_type: capture.event_type,
                    transaction_id: None,
                    normalization_error: Some(reason),
                })
            }
        }
    }

    /// Run adapter work on the blocking pool, bounded by the adapter timeout.
    async fn run_bounded<T, F>(&self, f: F) -> Result<T, BoundedError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => Err(BoundedError::Failed(join_error.to_string())),
            Err(_) => Err(BoundedError::TimedOut),
        }
    }
}

fn store_failed(platform: Platform, e: StoreError) -> IngestError {
    error!(platform = %platform, error = %e, "Store write failed");
    IngestError::StoreUnavailable(e.to_string())
}
