//! In-memory RecordStore for tests. No database, no Docker.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use salespulse_common::{NormalizedEvent, Platform};

use crate::error::{StoreError, StoreResult};
use crate::sanitize::storable;
use crate::store::RecordStore;
use crate::types::{EventFilter, StoredEvent, StoredId};

struct MemoryInner {
    rows: Vec<StoredEvent>,
    next_id: StoredId,
    /// When set, writes are stamped with this instant instead of `Utc::now()`.
    clock: Option<DateTime<Utc>>,
    last_created_at: Option<DateTime<Utc>>,
    fail_all: bool,
}

/// Stateful in-memory store mirroring the Postgres semantics: upsert by
/// `(platform, transaction_id)`, monotonic `created_at`, ascending reads.
pub struct MemoryRecordStore {
    inner: Mutex<MemoryInner>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                rows: Vec::new(),
                next_id: 1,
                clock: None,
                last_created_at: None,
                fail_all: false,
            }),
        }
    }

    /// Make every operation fail as if the database were down.
    pub fn failing(self) -> Self {
        self.inner.lock().unwrap().fail_all = true;
        self
    }

    /// Stamp subsequent writes with `now`.
    pub fn set_clock(&self, now: DateTime<Utc>) {
        self.inner.lock().unwrap().clock = Some(now);
    }

    pub fn rows(&self) -> Vec<StoredEvent> {
        self.inner.lock().unwrap().rows.clone()
    }

    fn write(&self, event: &NormalizedEvent, normalized: bool) -> StoreResult<StoredId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_all {
            return Err(StoreError::Unavailable("MemoryRecordStore: forced failure".into()));
        }
        let event = &storable(event);

        let mut now = inner.clock.unwrap_or_else(Utc::now);
        if let Some(last) = inner.last_created_at {
            now = now.max(last);
        }

        if let Some(tx) = event.transaction_id.as_deref() {
            if let Some(existing) = inner
                .rows
                .iter_mut()
                .find(|r| r.event.platform == event.platform && r.event.transaction_id.as_deref() == Some(tx))
            {
                existing.event = event.clone();
                existing.normalized = normalized;
                existing.updated_at = now;
                return Ok(existing.id);
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.last_created_at = Some(now);
        inner.rows.push(StoredEvent {
            id,
            event: event.clone(),
            normalized,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    fn read<F>(&self, pred: F) -> StoreResult<Vec<StoredEvent>>
    where
        F: Fn(&StoredEvent) -> bool,
    {
        let inner = self.inner.lock().unwrap();
        if inner.fail_all {
            return Err(StoreError::Unavailable("MemoryRecordStore: forced failure".into()));
        }
        let mut rows: Vec<StoredEvent> = inner.rows.iter().filter(|r| pred(r)).cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, event: &NormalizedEvent) -> StoreResult<StoredId> {
        self.write(event, true)
    }

    async fn capture_raw(&self, event: &NormalizedEvent) -> StoreResult<StoredId> {
        let mut capture = event.clone();
        capture.transaction_id = None;
        self.write(&capture, false)
    }

    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>> {
        self.read(|r| filter.matches(r))
    }

    async fn find_by_transaction(
        &self,
        platform: Platform,
        transaction_id: &str,
    ) -> StoreResult<Option<StoredEvent>> {
        let rows = self.read(|r| {
            r.event.platform == platform && r.event.transaction_id.as_deref() == Some(transaction_id)
        })?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_customer_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>> {
        self.read(|r| r.event.customer_email.as_deref() == Some(email))
    }

    async fn find_by_affiliate_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>> {
        self.read(|r| r.event.affiliate_email.as_deref() == Some(email))
    }

    async fn count(&self) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_all {
            return Err(StoreError::Unavailable("MemoryRecordStore: forced failure".into()));
        }
        Ok(inner.rows.len() as i64)
    }
}
