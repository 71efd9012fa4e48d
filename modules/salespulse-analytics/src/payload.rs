use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salespulse_common::Platform;

/// Parallel label/value arrays, the shape chart libraries consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    pub labels: Vec<String>,
    pub values: Vec<T>,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> Series<T> {
    pub fn push(&mut self, label: impl Into<String>, value: T) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub sales_value: Decimal,
    pub abandoned_value: Decimal,
    pub refunds_value: Decimal,
    pub total_sales: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRow {
    pub platform: Platform,
    pub sales_count: u64,
    pub profit: Decimal,
    pub average_ticket: Decimal,
    pub abandoned_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformAnalysis {
    pub table_data: Vec<PlatformRow>,
    pub chart_labels: Vec<String>,
    /// Each platform's share of total profit, in percent.
    pub chart_values: Vec<Decimal>,
}

/// Everything the dashboard renders for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub kpis: Kpis,
    /// Profit per day, `YYYY-MM-DD` labels, zero-filled.
    pub daily_trend: Series<Decimal>,
    pub platform_analysis: PlatformAnalysis,
    pub top_selling_products: Series<u64>,
    pub top_abandoned_products: Series<u64>,
    /// Refunded amount per platform.
    pub refund_analysis: Series<Decimal>,
}
