//! Dashboard aggregation over stored webhook records.
//!
//! Read-only: every request recomputes from the store over its date range.
//! Store failures are reported as [`QueryError::QueryFailed`], never as an
//! empty dashboard.
//!
//! [`QueryError::QueryFailed`]: salespulse_common::QueryError::QueryFailed

pub mod classify;
pub mod engine;
pub mod payload;
pub mod query;

pub use classify::{classify, classify_event, EventClass};
pub use engine::{aggregate, AggregationEngine};
pub use payload::{DashboardPayload, Kpis, PlatformAnalysis, PlatformRow, Series};
pub use query::{DashboardParams, DashboardQuery};
