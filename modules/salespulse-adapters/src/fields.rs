//! Field-path tables and value coercion shared by the adapters.
//!
//! A table lists, per unified field, the payload paths to try in order. The
//! first non-null value wins. Paths are dot-separated; numeric segments index
//! into arrays (`commissions.0.totalAmount`).

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

/// Event type used when a payload carries a transaction id but no event name.
pub const FALLBACK_EVENT_TYPE: &str = "webhook";

pub const DEFAULT_CURRENCY: &str = "BRL";

/// Largest amount the `NUMERIC(12, 2)` columns hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    WebhookId,
    TransactionId,
    CustomerEmail,
    CustomerName,
    CustomerDocument,
    ProductName,
    ProductId,
    Amount,
    Currency,
    PaymentMethod,
    Status,
    CommissionAmount,
    AffiliateEmail,
    UtmSource,
    UtmMedium,
    SalesLink,
    AttendantName,
    AttendantEmail,
}

pub type FieldTable = &'static [(Field, &'static [&'static str])];

/// Parse a request body as a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Value, NormalizationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| NormalizationError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(NormalizationError::NotAnObject);
    }
    Ok(value)
}

/// What gets stored as `raw_data` for a body: the parsed JSON when it parses,
/// otherwise a JSON string holding the body text.
pub fn raw_payload(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// Resolve a dot path. `null` counts as absent.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// First path that yields usable text. Numbers and booleans are rendered;
/// blank strings and nested structures are skipped. NUL characters are
/// dropped since Postgres text cannot hold them.
pub fn text(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match lookup(value, path)? {
        Value::String(s) => {
            let s = s.replace('\0', "");
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// First path that yields a usable monetary amount.
pub fn money(value: &Value, paths: &[&str]) -> Option<Decimal> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(parse_money))
}

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,.\-]").expect("valid regex"));

/// Parse a monetary value into a non-negative amount with two fractional
/// digits. JSON numbers are taken as-is. Strings lose currency symbols,
/// spaces and thousands separators, and a decimal comma becomes a point:
/// `"R$ 1.234,56"` is `1234.56`. Negative, oversized or unparseable values
/// are `None`.
pub fn parse_money(value: &Value) -> Option<Decimal> {
    parse_decimal(value).and_then(bounded)
}

/// Round to cents and reject amounts outside `0..=MAX_AMOUNT`.
pub fn bounded(amount: Decimal) -> Option<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    let amount = amount.round_dp(2);
    (amount <= MAX_AMOUNT).then_some(amount)
}

/// The raw numeric value, before any bounds are applied.
pub(crate) fn parse_decimal(value: &Value) -> Option<Decimal> {
    let amount = match value {
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))?,
        Value::String(s) => parse_money_str(s)?,
        _ => return None,
    };
    Some(amount)
}

fn parse_money_str(raw: &str) -> Option<Decimal> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        // Both present: whichever comes last is the decimal separator.
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned.into_owned(),
    };
    normalized.parse::<Decimal>().ok()
}

/// Apply a field table to `payload`, filling the unified fields of `event`.
pub fn apply(table: FieldTable, payload: &Value, event: &mut NormalizedEvent) {
    for &(field, paths) in table {
        match field {
            Field::Amount => event.amount = money(payload, paths),
            Field::CommissionAmount => event.commission_amount = money(payload, paths),
            _ => {
                if let Some(slot) = text_slot(event, field) {
                    *slot = text(payload, paths);
                }
            }
        }
    }
}

fn text_slot(event: &mut NormalizedEvent, field: Field) -> Option<&mut Option<String>> {
    let slot = match field {
        Field::WebhookId => &mut event.webhook_id,
        Field::TransactionId => &mut event.transaction_id,
        Field::CustomerEmail => &mut event.customer_email,
        Field::CustomerName => &mut event.customer_name,
        Field::CustomerDocument => &mut event.customer_document,
        Field::ProductName => &mut event.product_name,
        Field::ProductId => &mut event.product_id,
        Field::Currency => &mut event.currency,
        Field::PaymentMethod => &mut event.payment_method,
        Field::Status => &mut event.status,
        Field::AffiliateEmail => &mut event.affiliate_email,
        Field::UtmSource => &mut event.utm_source,
        Field::UtmMedium => &mut event.utm_medium,
        Field::SalesLink => &mut event.sales_link,
        Field::AttendantName => &mut event.attendant_name,
        Field::AttendantEmail => &mut event.attendant_email,
        Field::Amount | Field::CommissionAmount => return None,
    };
    Some(slot)
}

/// Shared normalization flow: resolve the event type, apply the table,
/// enforce the identity rule and default the currency.
pub fn normalize_with(
    platform: Platform,
    payload: Value,
    event_type_paths: &[&str],
    table: FieldTable,
) -> Result<NormalizedEvent, NormalizationError> {
    let event_type = text(&payload, event_type_paths);

    let mut event = NormalizedEvent::new(platform, "", Value::Null);
    apply(table, &payload, &mut event);

    event.event_type = match (event_type, &event.transaction_id) {
        (Some(event_type), _) => event_type,
        (None, Some(_)) => FALLBACK_EVENT_TYPE.to_string(),
        (None, None) => return Err(NormalizationError::MissingIdentity),
    };
    if event.currency.is_none() {
        event.currency = Some(DEFAULT_CURRENCY.to_string());
    }
    event.raw_data = payload;
    Ok(event)
}
