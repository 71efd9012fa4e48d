use std::sync::Arc;

use typed_builder::TypedBuilder;

use salespulse_adapters::Coordinator;
use salespulse_analytics::AggregationEngine;
use salespulse_common::AppConfig;
use salespulse_store::RecordStore;

use crate::renderer::ReportRenderer;

/// Long-lived dependencies shared by every handler.
#[derive(Clone, TypedBuilder)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub coordinator: Coordinator,
    pub engine: AggregationEngine,
    pub http_client: reqwest::Client,
    #[builder(default)]
    pub renderer: Option<Arc<dyn ReportRenderer>>,
}
