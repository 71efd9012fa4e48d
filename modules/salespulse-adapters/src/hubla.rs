use http::HeaderMap;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

use crate::adapter::WebhookAdapter;
use crate::fields::{self, Field, FieldTable};
use crate::signature;

pub const SIGNATURE_HEADER: &str = "x-hubla-signature";

const EVENT_TYPE: &[&str] = &["event"];

/// Hubla wraps everything in `{ "event": ..., "data": { ... } }`.
const FIELDS: FieldTable = &[
    (Field::TransactionId, &["data.id"]),
    (Field::Amount, &["data.amount"]),
    (Field::Status, &["data.status"]),
    (Field::AffiliateEmail, &["data.affiliate_email"]),
    (Field::CustomerEmail, &["data.customer.email"]),
    (Field::CustomerName, &["data.customer.name"]),
    (Field::CustomerDocument, &["data.customer.document"]),
    (Field::ProductId, &["data.product.id"]),
    (Field::ProductName, &["data.product.name"]),
    (Field::PaymentMethod, &["data.payment_method"]),
    (Field::CommissionAmount, &["data.commission_amount"]),
    (Field::Currency, &["data.currency"]),
    (Field::UtmSource, &["data.utm_source"]),
    (Field::UtmMedium, &["data.utm_medium"]),
];

pub struct HublaAdapter;

impl WebhookAdapter for HublaAdapter {
    fn platform(&self) -> Platform {
        Platform::Hubla
    }

    fn verify(&self, body: &[u8], headers: &HeaderMap, secret: &str) -> bool {
        signature::verify_header(headers, SIGNATURE_HEADER, secret, body)
    }

    fn normalize(&self, body: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
        let payload = fields::parse_object(body)?;
        fields::normalize_with(Platform::Hubla, payload, EVENT_TYPE, FIELDS)
    }
}
