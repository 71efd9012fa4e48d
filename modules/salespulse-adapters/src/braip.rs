use http::HeaderMap;
use rust_decimal::Decimal;
use serde_json::Value;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

use crate::adapter::WebhookAdapter;
use crate::fields::{self, Field, FieldTable};
use crate::signature;

pub const SIGNATURE_HEADER: &str = "x-braip-signature";

const EVENT_TYPE: &[&str] = &["event", "type"];

const FIELDS: FieldTable = &[
    (Field::WebhookId, &["transaction.id", "transaction_id"]),
    (Field::TransactionId, &["transaction.id", "transaction_id"]),
    (Field::CustomerEmail, &["customer.email", "customer_email"]),
    (Field::CustomerName, &["customer.name", "customer_name"]),
    (Field::CustomerDocument, &["customer.document", "customer.cpf"]),
    (Field::ProductName, &["product.name", "product_name"]),
    (Field::ProductId, &["product.id", "product_id"]),
    (Field::Currency, &["currency"]),
    (Field::CommissionAmount, &["affiliate.commission_amount"]),
    (Field::PaymentMethod, &["transaction.payment_method", "payment_method"]),
    (Field::Status, &["transaction.status", "status"]),
    (Field::AffiliateEmail, &["affiliate.email"]),
    (Field::UtmSource, &["utm_source"]),
    (Field::UtmMedium, &["utm_medium"]),
    (Field::SalesLink, &["sales_link"]),
    (Field::AttendantName, &["attendant_name"]),
    (Field::AttendantEmail, &["attendant_email"]),
];

/// Braip signs the body with HMAC-SHA256 and sends the hex digest in
/// `X-Braip-Signature`. Transaction values may arrive in cents.
pub struct BraipAdapter;

impl WebhookAdapter for BraipAdapter {
    fn platform(&self) -> Platform {
        Platform::Braip
    }

    fn verify(&self, body: &[u8], headers: &HeaderMap, secret: &str) -> bool {
        signature::verify_header(headers, SIGNATURE_HEADER, secret, body)
    }

    fn normalize(&self, body: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
        let payload = fields::parse_object(body)?;
        let mut event = fields::normalize_with(Platform::Braip, payload, EVENT_TYPE, FIELDS)?;
        event.amount = fields::lookup(&event.raw_data, "transaction.value").and_then(transaction_value);
        Ok(event)
    }
}

/// A JSON integer above 1000 is an amount in cents. Anything else goes
/// through the regular money parser.
fn transaction_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            let amount = fields::parse_decimal(value)?;
            if amount > Decimal::from(1000) {
                fields::bounded(amount / Decimal::from(100))
            } else {
                fields::bounded(amount)
            }
        }
        _ => fields::parse_money(value),
    }
}
