pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, WebhookSecrets};
pub use error::{IngestError, NormalizationError, QueryError};
pub use types::*;
