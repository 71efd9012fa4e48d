//! Per-platform status vocabulary.
//!
//! Each platform names its events and statuses differently. One table per
//! platform maps the normalized token to a class. The event type is checked
//! first; the status is only consulted when the event type is unknown.

use serde::{Deserialize, Serialize};

use salespulse_common::{NormalizedEvent, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    Approved,
    Abandoned,
    Refunded,
    Other,
}

use EventClass::{Abandoned, Approved, Refunded};

type Vocabulary = &'static [(&'static str, EventClass)];

const BRAIP: Vocabulary = &[
    ("sale_approved", Approved),
    ("approved", Approved),
    ("paid", Approved),
    ("venda_aprovada", Approved),
    ("pagamento_aprovado", Approved),
    ("abandoned_cart", Abandoned),
    ("cart_abandoned", Abandoned),
    ("checkout_abandoned", Abandoned),
    ("carrinho_abandonado", Abandoned),
    ("refund", Refunded),
    ("refunded", Refunded),
    ("sale_refunded", Refunded),
    ("chargeback", Refunded),
    ("reembolsado", Refunded),
    ("estornado", Refunded),
];

const HUBLA: Vocabulary = &[
    ("sale_approved", Approved),
    ("newsale", Approved),
    ("invoice_paid", Approved),
    ("subscription_activated", Approved),
    ("paid", Approved),
    ("approved", Approved),
    ("abandoned_checkout", Abandoned),
    ("lead_abandoned_checkout", Abandoned),
    ("cart_abandoned", Abandoned),
    ("refund", Refunded),
    ("refunded", Refunded),
    ("sale_refunded", Refunded),
    ("invoice_refunded", Refunded),
    ("chargeback", Refunded),
];

const KIRVANO: Vocabulary = &[
    ("sale_approved", Approved),
    ("purchase_completed", Approved),
    ("approved", Approved),
    ("paid", Approved),
    ("abandoned_cart", Abandoned),
    ("cart_abandoned", Abandoned),
    ("refund", Refunded),
    ("refunded", Refunded),
    ("sale_refunded", Refunded),
    ("chargeback", Refunded),
    ("sale_chargeback", Refunded),
];

const CAKTO: Vocabulary = &[
    ("purchase_approved", Approved),
    ("sale_approved", Approved),
    ("approved", Approved),
    ("paid", Approved),
    ("checkout_abandonment", Abandoned),
    ("abandoned_cart", Abandoned),
    ("cart_abandoned", Abandoned),
    ("refund", Refunded),
    ("refunded", Refunded),
    ("purchase_refunded", Refunded),
    ("chargeback", Refunded),
];

fn vocabulary(platform: Platform) -> Vocabulary {
    match platform {
        Platform::Braip => BRAIP,
        Platform::Hubla => HUBLA,
        Platform::Kirvano => KIRVANO,
        Platform::Cakto => CAKTO,
    }
}

/// Lowercase, trim, and fold `.`, `-` and spaces into `_`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '.' | '-' | ' ') { '_' } else { c })
        .collect()
}

fn lookup(platform: Platform, raw: &str) -> Option<EventClass> {
    let token = normalize_token(raw);
    vocabulary(platform)
        .iter()
        .find(|(known, _)| *known == token)
        .map(|&(_, class)| class)
}

pub fn classify(platform: Platform, event_type: &str, status: Option<&str>) -> EventClass {
    lookup(platform, event_type)
        .or_else(|| status.and_then(|s| lookup(platform, s)))
        .unwrap_or(EventClass::Other)
}

pub fn classify_event(event: &NormalizedEvent) -> EventClass {
    classify(event.platform, &event.event_type, event.status.as_deref())
}
