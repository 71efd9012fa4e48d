use http::HeaderMap;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

/// One commerce platform's view of an inbound notification.
///
/// Both methods are synchronous and CPU-bound; the coordinator runs them on
/// the blocking pool under a timeout.
pub trait WebhookAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Check the delivery against the platform's shared secret. Comparison
    /// must be constant-time.
    fn verify(&self, body: &[u8], headers: &HeaderMap, secret: &str) -> bool;

    /// Map the payload into the unified schema. Absent fields become `None`.
    /// Fails when the body is not a JSON object or carries neither an event
    /// type nor a transaction id.
    fn normalize(&self, body: &[u8]) -> Result<NormalizedEvent, NormalizationError>;

    /// Name for logging.
    fn name(&self) -> &'static str {
        self.platform().as_str()
    }
}
