use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salespulse_common::{NormalizedEvent, Platform};

pub type StoredId = i64;

/// A record as stored in Postgres. Returned by all read methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: StoredId,
    #[serde(flatten)]
    pub event: NormalizedEvent,
    /// False for best-effort captures of payloads that failed normalization.
    pub normalized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read filter. The time range is half-open: `from <= created_at < until`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub platform: Option<Platform>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn matches(&self, stored: &StoredEvent) -> bool {
        self.platform.map_or(true, |p| stored.event.platform == p)
            && self.from.map_or(true, |from| stored.created_at >= from)
            && self.until.map_or(true, |until| stored.created_at < until)
    }
}
