use http::HeaderMap;
use serde_json::Value;

use salespulse_common::{NormalizationError, NormalizedEvent, Platform};

use crate::adapter::WebhookAdapter;
use crate::fields::{self, Field, FieldTable};
use crate::signature;

/// Event type given to orders pulled through the order sync rather than pushed.
pub const SYNCED_ORDER_EVENT_TYPE: &str = "order_sync";

const EVENT_TYPE: &[&str] = &["event"];

/// Order fields, relative to the order object itself.
const ORDER_FIELDS: FieldTable = &[
    (Field::TransactionId, &["id"]),
    (Field::WebhookId, &["refId"]),
    (Field::Amount, &["amount"]),
    (Field::Status, &["status"]),
    (Field::PaymentMethod, &["paymentMethod"]),
    (Field::CustomerEmail, &["customer.email"]),
    (Field::CustomerName, &["customer.name"]),
    (Field::CustomerDocument, &["customer.docNumber"]),
    (Field::ProductId, &["product.id"]),
    (Field::ProductName, &["product.name"]),
    (Field::CommissionAmount, &["commissions.0.totalAmount"]),
    (Field::AffiliateEmail, &["affiliate.email"]),
    (Field::Currency, &["currency"]),
];

/// Webhook fields: the order sits under `data` in `{ secret, event, data }`.
const WEBHOOK_FIELDS: FieldTable = &[
    (Field::TransactionId, &["data.id"]),
    (Field::WebhookId, &["data.refId"]),
    (Field::Amount, &["data.amount"]),
    (Field::Status, &["data.status"]),
    (Field::PaymentMethod, &["data.paymentMethod"]),
    (Field::CustomerEmail, &["data.customer.email"]),
    (Field::CustomerName, &["data.customer.name"]),
    (Field::CustomerDocument, &["data.customer.docNumber"]),
    (Field::ProductId, &["data.product.id"]),
    (Field::ProductName, &["data.product.name"]),
    (Field::CommissionAmount, &["data.commissions.0.totalAmount"]),
    (Field::AffiliateEmail, &["data.affiliate.email"]),
    (Field::Currency, &["data.currency"]),
];

/// Cakto has no signature header; the shared secret travels in the body.
pub struct CaktoAdapter;

impl WebhookAdapter for CaktoAdapter {
    fn platform(&self) -> Platform {
        Platform::Cakto
    }

    fn verify(&self, body: &[u8], _headers: &HeaderMap, secret: &str) -> bool {
        let Ok(payload) = serde_json::from_slice::<Value>(body) else {
            return false;
        };
        payload
            .get("secret")
            .and_then(Value::as_str)
            .is_some_and(|provided| signature::constant_time_eq(provided.as_bytes(), secret.as_bytes()))
    }

    fn normalize(&self, body: &[u8]) -> Result<NormalizedEvent, NormalizationError> {
        let payload = fields::parse_object(body)?;
        fields::normalize_with(Platform::Cakto, payload, EVENT_TYPE, WEBHOOK_FIELDS)
    }
}

/// Map one order object returned by the Cakto orders API.
pub fn normalize_order(order: &Value) -> Result<NormalizedEvent, NormalizationError> {
    if !order.is_object() {
        return Err(NormalizationError::NotAnObject);
    }
    let mut event = fields::normalize_with(Platform::Cakto, order.clone(), &[], ORDER_FIELDS)?;
    event.event_type = SYNCED_ORDER_EVENT_TYPE.to_string();
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order() -> Value {
        json!({
            "id": "ck-1",
            "refId": "REF1",
            "amount": 197.0,
            "status": "paid",
            "paymentMethod": "credit_card",
            "customer": {"email": "ana@example.com", "name": "Ana", "docNumber": "999"},
            "product": {"id": "prod-1", "name": "Comunidade"},
            "commissions": [{"totalAmount": 47.0}, {"totalAmount": 1.0}],
            "affiliate": {"email": "aff@example.com"}
        })
    }

    #[test]
    fn maps_webhook_envelope() {
        let body = json!({"secret": "s3cret", "event": "purchase_approved", "data": order()}).to_string();
        let event = CaktoAdapter.normalize(body.as_bytes()).unwrap();

        assert_eq!(event.event_type, "purchase_approved");
        assert_eq!(event.transaction_id.as_deref(), Some("ck-1"));
        assert_eq!(event.webhook_id.as_deref(), Some("REF1"));
        assert_eq!(event.amount, Some(dec("197")));
        assert_eq!(event.commission_amount, Some(dec("47")));
        assert_eq!(event.customer_document.as_deref(), Some("999"));
        assert_eq!(event.payment_method.as_deref(), Some("credit_card"));
        assert_eq!(event.affiliate_email.as_deref(), Some("aff@example.com"));
        assert_eq!(event.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn maps_synced_order() {
        let event = normalize_order(&order()).unwrap();
        assert_eq!(event.event_type, SYNCED_ORDER_EVENT_TYPE);
        assert_eq!(event.transaction_id.as_deref(), Some("ck-1"));
        assert_eq!(event.product_name.as_deref(), Some("Comunidade"));
        assert_eq!(event.raw_data, order());
    }

    #[test]
    fn order_without_id_is_rejected() {
        assert_eq!(
            normalize_order(&json!({"amount": 10})).unwrap_err(),
            NormalizationError::MissingIdentity
        );
        assert_eq!(normalize_order(&json!("x")).unwrap_err(), NormalizationError::NotAnObject);
    }

    #[test]
    fn verify_compares_body_secret() {
        let headers = HeaderMap::new();
        let good = br#"{"secret":"s3cret","event":"purchase_approved"}"#;
        let bad = br#"{"secret":"nope","event":"purchase_approved"}"#;
        let missing = br#"{"event":"purchase_approved"}"#;

        assert!(CaktoAdapter.verify(good, &headers, "s3cret"));
        assert!(!CaktoAdapter.verify(bad, &headers, "s3cret"));
        assert!(!CaktoAdapter.verify(missing, &headers, "s3cret"));
        assert!(!CaktoAdapter.verify(b"not json", &headers, "s3cret"));
    }
}
