use thiserror::Error;

use crate::Platform;

/// Failures of the ingestion path that reach the caller. Normalization gaps
/// are not here: an authenticated payload that cannot be mapped is still
/// stored (see [`NormalizationError`]).
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("authentication failed for {0}")]
    AuthenticationFailed(Platform),

    /// Retryable. The sending platform's own retry policy takes over.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Why an adapter could not map a payload into the unified schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload carries neither an event type nor a transaction id")]
    MissingIdentity,

    #[error("normalization timed out")]
    Timeout,

    /// The adapter task died (panicked or was cancelled) before returning.
    #[error("adapter failed: {0}")]
    AdapterFailed(String),
}

/// Failures of the dashboard read path.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The store could not be read. Never reported as an empty result.
    #[error("query failed: {0}")]
    QueryFailed(String),
}
