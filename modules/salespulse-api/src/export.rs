//! Tabular export of stored records (CSV here, Excel via the renderer).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use salespulse_common::Platform;
use salespulse_store::StoredEvent;

/// Column order of [`ExportRow`], written even when there are no rows.
pub const HEADERS: [&str; 23] = [
    "id",
    "platform",
    "event_type",
    "webhook_id",
    "transaction_id",
    "customer_email",
    "customer_name",
    "customer_document",
    "product_name",
    "product_id",
    "amount",
    "currency",
    "payment_method",
    "status",
    "commission_amount",
    "affiliate_email",
    "utm_source",
    "utm_medium",
    "sales_link",
    "attendant_name",
    "attendant_email",
    "normalized",
    "created_at",
];

/// One exported row: the unified columns, without `raw_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub platform: Platform,
    pub event_type: String,
    pub webhook_id: Option<String>,
    pub transaction_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    /// Decimal text so spreadsheets see exactly what was stored.
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub commission_amount: Option<String>,
    pub affiliate_email: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub sales_link: Option<String>,
    pub attendant_name: Option<String>,
    pub attendant_email: Option<String>,
    pub normalized: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredEvent> for ExportRow {
    fn from(stored: &StoredEvent) -> Self {
        let e = &stored.event;
        Self {
            id: stored.id,
            platform: e.platform,
            event_type: e.event_type.clone(),
            webhook_id: e.webhook_id.clone(),
            transaction_id: e.transaction_id.clone(),
            customer_email: e.customer_email.clone(),
            customer_name: e.customer_name.clone(),
            customer_document: e.customer_document.clone(),
            product_name: e.product_name.clone(),
            product_id: e.product_id.clone(),
            amount: e.amount.map(|d| d.to_string()),
            currency: e.currency.clone(),
            payment_method: e.payment_method.clone(),
            status: e.status.clone(),
            commission_amount: e.commission_amount.map(|d| d.to_string()),
            affiliate_email: e.affiliate_email.clone(),
            utm_source: e.utm_source.clone(),
            utm_medium: e.utm_medium.clone(),
            sales_link: e.sales_link.clone(),
            attendant_name: e.attendant_name.clone(),
            attendant_email: e.attendant_email.clone(),
            normalized: stored.normalized,
            created_at: stored.created_at,
        }
    }
}

/// Rows newest first. Store reads come back oldest first.
pub fn newest_first(records: &[StoredEvent]) -> Vec<ExportRow> {
    records.iter().rev().map(ExportRow::from).collect()
}

/// Render rows as CSV with a header line.
pub fn render_csv(rows: &[ExportRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Rows grouped per platform, one sheet each in the Excel report.
pub fn group_by_platform(rows: Vec<ExportRow>) -> BTreeMap<String, Vec<ExportRow>> {
    let mut sheets: BTreeMap<String, Vec<ExportRow>> = BTreeMap::new();
    for row in rows {
        sheets.entry(row.platform.to_string()).or_default().push(row);
    }
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use salespulse_common::NormalizedEvent;
    use serde_json::json;

    fn stored(id: i64, platform: Platform, minute: u32) -> StoredEvent {
        let created_at = Utc.with_ymd_and_hms(2025, 4, 1, 12, minute, 0).unwrap();
        StoredEvent {
            id,
            event: NormalizedEvent::new(platform, "sale_approved", json!({"secret": "do-not-export"}))
                .with_transaction_id(format!("T{id}"))
                .with_amount("1234.50".parse().unwrap()),
            normalized: true,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn csv_has_header_and_omits_raw_data() {
        let rows = newest_first(&[stored(1, Platform::Hubla, 0)]);
        let csv = String::from_utf8(render_csv(&rows).unwrap()).unwrap();

        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,platform,event_type,webhook_id,transaction_id"));
        assert!(!header.contains("raw_data"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,hubla,sale_approved,,T1"));
        assert!(row.contains("1234.50"));
        assert!(!csv.contains("do-not-export"));
    }

    #[test]
    fn newest_rows_come_first() {
        let records = vec![stored(1, Platform::Hubla, 0), stored(2, Platform::Braip, 5)];
        let ids: Vec<i64> = newest_first(&records).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn empty_export_still_has_the_header() {
        let csv = String::from_utf8(render_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, format!("{}\n", HEADERS.join(",")));
    }

    #[test]
    fn header_matches_serialized_columns() {
        let rows = newest_first(&[stored(1, Platform::Hubla, 0)]);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&rows[0]).unwrap();
        let serialized = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(serialized.lines().next(), Some(HEADERS.join(",").as_str()));
        assert_eq!(render_csv(&rows).unwrap(), serialized.into_bytes());
    }

    #[test]
    fn groups_rows_per_platform() {
        let rows = newest_first(&[
            stored(1, Platform::Hubla, 0),
            stored(2, Platform::Braip, 1),
            stored(3, Platform::Hubla, 2),
        ]);
        let sheets = group_by_platform(rows);
        assert_eq!(sheets.keys().collect::<Vec<_>>(), vec!["braip", "hubla"]);
        assert_eq!(sheets["hubla"].len(), 2);
    }
}
