use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// --- Platforms ---

/// The commerce platforms we accept notifications from. Closed set: adding a
/// platform means adding a variant here and one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Braip,
    Hubla,
    Kirvano,
    Cakto,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Braip,
        Platform::Hubla,
        Platform::Kirvano,
        Platform::Cakto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Braip => "braip",
            Platform::Hubla => "hubla",
            Platform::Kirvano => "kirvano",
            Platform::Cakto => "cakto",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::IngestError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "braip" => Ok(Platform::Braip),
            "hubla" => Ok(Platform::Hubla),
            "kirvano" => Ok(Platform::Kirvano),
            "cakto" => Ok(Platform::Cakto),
            _ => Err(crate::IngestError::UnknownPlatform(s.to_string())),
        }
    }
}

// --- Normalized record ---

/// Event type recorded for authenticated payloads that could not be mapped.
pub const UNPROCESSED_EVENT_TYPE: &str = "unprocessed";

/// The unified record every adapter produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub platform: Platform,
    pub event_type: String,
    pub webhook_id: Option<String>,
    pub transaction_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub commission_amount: Option<Decimal>,
    pub affiliate_email: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub sales_link: Option<String>,
    pub attendant_name: Option<String>,
    pub attendant_email: Option<String>,
    pub raw_data: serde_json::Value,
}

impl NormalizedEvent {
    /// An event with only identity and payload set; every descriptive field is null.
    pub fn new(
        platform: Platform,
        event_type: impl Into<String>,
        raw_data: serde_json::Value,
    ) -> Self {
        Self {
            platform,
            event_type: event_type.into(),
            webhook_id: None,
            transaction_id: None,
            customer_email: None,
            customer_name: None,
            customer_document: None,
            product_name: None,
            product_id: None,
            amount: None,
            currency: None,
            payment_method: None,
            status: None,
            commission_amount: None,
            affiliate_email: None,
            utm_source: None,
            utm_medium: None,
            sales_link: None,
            attendant_name: None,
            attendant_email: None,
            raw_data,
        }
    }

    /// Best-effort capture of an authenticated payload that failed normalization.
    pub fn raw_capture(platform: Platform, raw_data: serde_json::Value) -> Self {
        Self::new(platform, UNPROCESSED_EVENT_TYPE, raw_data)
    }

    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission_amount = Some(commission);
        self
    }

    pub fn with_product(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Label used when grouping by product: the name, else the id.
    pub fn product_label(&self) -> Option<&str> {
        self.product_name
            .as_deref()
            .or(self.product_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// `amount - commission_amount`, or `amount` when no commission was paid.
    pub fn profit(&self) -> Decimal {
        let amount = self.amount.unwrap_or_default();
        match self.commission_amount {
            Some(commission) => amount - commission,
            None => amount,
        }
    }
}
