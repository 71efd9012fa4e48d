use http::HeaderMap;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

use crate::adapter::WebhookAdapter;
use crate::fields::{self, Field, FieldTable};
use crate::signature;

pub const SIGNATURE_HEADER: &str = "x-kirvano-signature";

const EVENT_TYPE: &[&str] = &["event_type", "event"];

/// Kirvano already sends the unified field names at the top level.
const FIELDS: FieldTable = &[
    (Field::WebhookId, &["webhook_id"]),
    (Field::TransactionId, &["transaction_id"]),
    (Field::CustomerEmail, &["customer_email"]),
    (Field::CustomerName, &["customer_name"]),
    (Field::CustomerDocument, &["customer_document"]),
    (Field::ProductName, &["product_name"]),
    (Field::ProductId, &["product_id"]),
    (Field::Amount, &["amount"]),
    (Field::Currency, &["currency"]),
    (Field::PaymentMethod, &["payment_method"]),
    (Field::Status, &["status"]),
    (Field::CommissionAmount, &["commission_amount"]),
    (Field::AffiliateEmail, &["affiliate_email"]),
    (Field::UtmSource, &["utm_source"]),
    (Field::UtmMedium, &["utm_medium"]),
    (Field::SalesLink, &["sales_link"]),
];

pub struct KirvanoAdapter;

impl WebhookAdapter for KirvanoAdapter {
    fn platform(&self) -> Platform {
        Platform::Kirvano
    }

    fn verify(&self, body: &[u8], headers: &HeaderMap, secret: &str) -> bool {
        signature::verify_header(headers, SIGNATURE_HEADER, secret, body)
    }

    fn normalize(&self, body: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
        let payload = fields::parse_object(body)?;
        fields::normalize_with(Platform::Kirvano, payload, EVENT_TYPE, FIELDS)
    }
}
