//! Postgres cannot store U+0000 in TEXT or JSONB. Records are cleaned here
//! before every write so an authenticated delivery is never refused by the
//! database over its content.

use serde_json::Value;

use salespulse_common::NormalizedEvent;

/// Text that takes the place of a NUL inside `raw_data` strings and keys.
pub const NUL_ESCAPE: &str = "\\u0000";

/// Copy of `event` that Postgres accepts. NULs are dropped from the unified
/// text columns and spelled out as [`NUL_ESCAPE`] inside `raw_data`.
pub fn storable(event: &NormalizedEvent) -> NormalizedEvent {
    let mut event = event.clone();
    strip_nul(&mut event.event_type);
    for slot in [
        &mut event.webhook_id,
        &mut event.transaction_id,
        &mut event.customer_email,
        &mut event.customer_name,
        &mut event.customer_document,
        &mut event.product_name,
        &mut event.product_id,
        &mut event.currency,
        &mut event.payment_method,
        &mut event.status,
        &mut event.affiliate_email,
        &mut event.utm_source,
        &mut event.utm_medium,
        &mut event.sales_link,
        &mut event.attendant_name,
        &mut event.attendant_email,
    ] {
        if let Some(text) = slot {
            strip_nul(text);
        }
    }
    escape_nul(&mut event.raw_data);
    event
}

fn strip_nul(text: &mut String) {
    if text.contains('\0') {
        text.retain(|c| c != '\0');
    }
}

fn escape_nul(value: &mut Value) {
    match value {
        Value::String(s) if s.contains('\0') => *s = s.replace('\0', NUL_ESCAPE),
        Value::Array(items) => items.iter_mut().for_each(escape_nul),
        Value::Object(map) => {
            if map.keys().any(|k| k.contains('\0')) {
                let entries = std::mem::take(map);
                for (key, mut item) in entries {
                    escape_nul(&mut item);
                    map.insert(key.replace('\0', NUL_ESCAPE), item);
                }
            } else {
                map.values_mut().for_each(escape_nul);
            }
        }
        _ => {}
    }
}
