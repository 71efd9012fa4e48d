use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, error};

use salespulse_common::{Platform, QueryError};
use salespulse_store::{EventFilter, RecordStore, StoredEvent};

use crate::classify::{classify_event, EventClass};
use crate::payload::{DashboardPayload, Kpis, PlatformAnalysis, PlatformRow, Series};
use crate::query::DashboardQuery;

/// Reads the store and aggregates. Holds no state between requests.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn RecordStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn compute(&self, query: &DashboardQuery) -> Result<DashboardPayload, QueryError> {
        let events = self.records(&query.filter()).await?;
        debug!(
            start_date = %query.start_date,
            end_date = %query.end_date,
            platform = ?query.platform,
            events = events.len(),
            "Aggregating dashboard"
        );
        Ok(aggregate(&events, query))
    }

    /// Filtered records in ascending `created_at` order, for exports.
    pub async fn records(&self, filter: &EventFilter) -> Result<Vec<StoredEvent>, QueryError> {
        self.store.query(filter).await.map_err(|e| {
            error!(error = %e, "Dashboard query failed");
            QueryError::QueryFailed(e.to_string())
        })
    }
}

#[derive(Default)]
struct PlatformTotals {
    sales_count: u64,
    profit: Decimal,
    abandoned_count: u64,
    refunds: Decimal,
    refund_count: u64,
}

#[derive(Default)]
struct ProductTotals {
    count: u64,
    amount: Decimal,
}

/// Aggregate `events` for `query` in a single pass. Events outside the
/// query's window or platform are ignored.
pub fn aggregate(events: &[StoredEvent], query: &DashboardQuery) -> DashboardPayload {
    let filter = query.filter();

    let mut kpis = Kpis::default();
    let mut daily: BTreeMap<NaiveDate, Decimal> = query.days().map(|d| (d, Decimal::ZERO)).collect();
    let mut platforms: BTreeMap<Platform, PlatformTotals> = BTreeMap::new();
    let mut selling: HashMap<String, ProductTotals> = HashMap::new();
    let mut abandoned: HashMap<String, ProductTotals> = HashMap::new();

    for stored in events.iter().filter(|e| filter.matches(e)) {
        let event = &stored.event;
        let amount = event.amount.unwrap_or_default();
        let totals = platforms.entry(event.platform).or_default();

        match classify_event(event) {
            EventClass::Approved => {
                let profit = event.profit();
                kpis.sales_value += amount;
                kpis.total_sales += 1;
                totals.sales_count += 1;
                totals.profit += profit;
                if let Some(day) = daily.get_mut(&stored.created_at.date_naive()) {
                    *day += profit;
                }
                if let Some(label) = event.product_label() {
                    tally(&mut selling, label, amount);
                }
            }
            EventClass::Abandoned => {
                kpis.abandoned_value += amount;
                totals.abandoned_count += 1;
                if let Some(label) = event.product_label() {
                    tally(&mut abandoned, label, amount);
                }
            }
            EventClass::Refunded => {
                kpis.refunds_value += amount;
                totals.refunds += amount;
                totals.refund_count += 1;
            }
            EventClass::Other => {}
        }
    }

    let mut daily_trend = Series::default();
    for (day, profit) in daily {
        daily_trend.push(day.format("%Y-%m-%d").to_string(), profit);
    }

    DashboardPayload {
        kpis,
        daily_trend,
        platform_analysis: platform_analysis(&platforms),
        top_selling_products: top_n(selling, query.top_n),
        top_abandoned_products: top_n(abandoned, query.top_n),
        refund_analysis: refund_analysis(&platforms),
    }
}

fn tally(products: &mut HashMap<String, ProductTotals>, label: &str, amount: Decimal) {
    let entry = products.entry(label.to_string()).or_default();
    entry.count += 1;
    entry.amount += amount;
}

/// Rank by count desc, then amount desc, then label asc.
fn top_n(products: HashMap<String, ProductTotals>, n: usize) -> Series<u64> {
    let mut ranked: Vec<(String, ProductTotals)> = products.into_iter().collect();
    ranked.sort_by(|(la, a), (lb, b)| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.amount.cmp(&a.amount))
            .then_with(|| la.cmp(lb))
    });

    let mut series = Series::default();
    for (label, totals) in ranked.into_iter().take(n) {
        series.push(label, totals.count);
    }
    series
}

fn platform_analysis(platforms: &BTreeMap<Platform, PlatformTotals>) -> PlatformAnalysis {
    let total_profit: Decimal = platforms.values().map(|t| t.profit).sum();
    let hundred = Decimal::from(100);

    let mut analysis = PlatformAnalysis::default();
    for (platform, totals) in platforms {
        let average_ticket = if totals.sales_count == 0 {
            Decimal::ZERO
        } else {
            (totals.profit / Decimal::from(totals.sales_count)).round_dp(2)
        };
        let share = if total_profit.is_zero() {
            Decimal::ZERO
        } else {
            (totals.profit / total_profit * hundred).round_dp(2)
        };

        analysis.table_data.push(PlatformRow {
            platform: *platform,
            sales_count: totals.sales_count,
            profit: totals.profit,
            average_ticket,
            abandoned_count: totals.abandoned_count,
        });
        analysis.chart_labels.push(platform.to_string());
        analysis.chart_values.push(share);
    }
    analysis
}

fn refund_analysis(platforms: &BTreeMap<Platform, PlatformTotals>) -> Series<Decimal> {
    let mut series = Series::default();
    for (platform, totals) in platforms.iter().filter(|(_, t)| t.refund_count > 0) {
        series.push(platform.to_string(), totals.refunds);
    }
    series
}
