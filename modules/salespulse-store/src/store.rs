//! The persistence seam for webhook records, plus its Postgres implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use salespulse_common::{NormalizedEvent, Platform};

use crate::error::{StoreError, StoreResult};
use crate::sanitize::storable;
use crate::types::{EventFilter, StoredEvent, StoredId};

/// Durable storage for normalized records.
///
/// Implementations must make a row visible only once its write has
/// committed: readers never observe a half-written record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert, or update in place when `(platform, transaction_id)` already
    /// exists. Records without a transaction id are always inserted.
    async fn upsert(&self, event: &NormalizedEvent) -> StoreResult<StoredId>;

    /// Store an authenticated payload that could not be normalized. Always
    /// inserts, with `normalized = false`.
    async fn capture_raw(&self, event: &NormalizedEvent) -> StoreResult<StoredId>;

    /// Records matching the filter, ordered by `created_at` then `id` ascending.
    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>>;

    async fn find_by_transaction(
        &self,
        platform: Platform,
        transaction_id: &str,
    ) -> StoreResult<Option<StoredEvent>>;

    async fn find_by_customer_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>>;

    async fn find_by_affiliate_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>>;

    /// Total number of stored rows.
    async fn count(&self) -> StoreResult<i64>;
}

// ---------------------------------------------------------------------------
// PgRecordStore
// ---------------------------------------------------------------------------

macro_rules! select_webhooks {
    ($tail:literal) => {
        concat!(
            r#"
            SELECT id, platform, event_type, webhook_id, transaction_id,
                   customer_email, customer_name, customer_document,
                   product_name, product_id, amount, currency, payment_method,
                   status, commission_amount, affiliate_email, utm_source,
                   utm_medium, sales_link, attendant_name, attendant_email,
                   raw_data, normalized, created_at, updated_at
            FROM webhooks
            "#,
            $tail
        )
    };
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn write(&self, event: &NormalizedEvent, normalized: bool) -> StoreResult<StoredId> {
        let event = &storable(event);
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO webhooks (
                platform, event_type, webhook_id, transaction_id,
                customer_email, customer_name, customer_document,
                product_name, product_id, amount, currency, payment_method,
                status, commission_amount, affiliate_email, utm_source,
                utm_medium, sales_link, attendant_name, attendant_email,
                raw_data, normalized
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            ON CONFLICT (platform, transaction_id) DO UPDATE SET
                event_type = EXCLUDED.event_type,
                webhook_id = EXCLUDED.webhook_id,
                customer_email = EXCLUDED.customer_email,
                customer_name = EXCLUDED.customer_name,
                customer_document = EXCLUDED.customer_document,
                product_name = EXCLUDED.product_name,
                product_id = EXCLUDED.product_id,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                payment_method = EXCLUDED.payment_method,
                status = EXCLUDED.status,
                commission_amount = EXCLUDED.commission_amount,
                affiliate_email = EXCLUDED.affiliate_email,
                utm_source = EXCLUDED.utm_source,
                utm_medium = EXCLUDED.utm_medium,
                sales_link = EXCLUDED.sales_link,
                attendant_name = EXCLUDED.attendant_name,
                attendant_email = EXCLUDED.attendant_email,
                raw_data = EXCLUDED.raw_data,
                normalized = EXCLUDED.normalized,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(event.platform.as_str())
        .bind(&event.event_type)
        .bind(&event.webhook_id)
        .bind(&event.transaction_id)
        .bind(&event.customer_email)
        .bind(&event.customer_name)
        .bind(&event.customer_document)
        .bind(&event.product_name)
        .bind(&event.product_id)
        .bind(event.amount)
        .bind(&event.currency)
        .bind(&event.payment_method)
        .bind(&event.status)
        .bind(event.commission_amount)
        .bind(&event.affiliate_email)
        .bind(&event.utm_source)
        .bind(&event.utm_medium)
        .bind(&event.sales_link)
        .bind(&event.attendant_name)
        .bind(&event.attendant_email)
        .bind(&event.raw_data)
        .bind(normalized)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = row.0, platform = %event.platform, normalized, "Record written");
        Ok(row.0)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn upsert(&self, event: &NormalizedEvent) -> StoreResult<StoredId> {
        self.write(event, true).await
    }

    async fn capture_raw(&self, event: &NormalizedEvent) -> StoreResult<StoredId> {
        // A raw capture carries no transaction id, so the conflict arm never fires.
        let mut capture = event.clone();
        capture.transaction_id = None;
        self.write(&capture, false).await
    }

    async fn query(&self, filter: &EventFilter) -> StoreResult<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(select_webhooks!(
            r#"
            WHERE ($1::text IS NULL OR platform = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(filter.platform.map(|p| p.as_str()))
        .bind(filter.from)
        .bind(filter.until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_transaction(
        &self,
        platform: Platform,
        transaction_id: &str,
    ) -> StoreResult<Option<StoredEvent>> {
        let row = sqlx::query_as::<_, StoredEvent>(select_webhooks!(
            "WHERE platform = $1 AND transaction_id = $2"
        ))
        .bind(platform.as_str())
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_customer_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(select_webhooks!(
            "WHERE customer_email = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_affiliate_email(&self, email: &str) -> StoreResult<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(select_webhooks!(
            "WHERE affiliate_email = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> StoreResult<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM webhooks")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}

// ---------------------------------------------------------------------------
// sqlx::FromRow for StoredEvent
// ---------------------------------------------------------------------------

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEvent {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;

        let id: i64 = row.try_get("id")?;
        let platform: String = row.try_get("platform")?;
        let platform = platform.parse::<Platform>().map_err(|e| {
            sqlx::Error::Decode(Box::new(StoreError::CorruptRow {
                id,
                reason: e.to_string(),
            }))
        })?;

        Ok(StoredEvent {
            id,
            event: NormalizedEvent {
                platform,
                event_type: row.try_get("event_type")?,
                webhook_id: row.try_get("webhook_id")?,
                transaction_id: row.try_get("transaction_id")?,
                customer_email: row.try_get("customer_email")?,
                customer_name: row.try_get("customer_name")?,
                customer_document: row.try_get("customer_document")?,
                product_name: row.try_get("product_name")?,
                product_id: row.try_get("product_id")?,
                amount: row.try_get("amount")?,
                currency: row.try_get("currency")?,
                payment_method: row.try_get("payment_method")?,
                status: row.try_get("status")?,
                commission_amount: row.try_get("commission_amount")?,
                affiliate_email: row.try_get("affiliate_email")?,
                utm_source: row.try_get("utm_source")?,
                utm_medium: row.try_get("utm_medium")?,
                sales_link: row.try_get("sales_link")?,
                attendant_name: row.try_get("attendant_name")?,
                attendant_email: row.try_get("attendant_email")?,
                raw_data: row.try_get("raw_data")?,
            },
            normalized: row.try_get("normalized")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
