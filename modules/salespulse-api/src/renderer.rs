//! Client for the external report renderer (PDF / Excel generation).

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use salespulse_analytics::DashboardPayload;

use crate::export::ExportRow;

pub const EXCEL_FILENAME: &str = "relatorio_webhooks.xlsx";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("renderer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("renderer returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// A rendered document and the content type the renderer reported.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Rows for the Excel report, one sheet per platform.
#[derive(Debug, Clone, Serialize)]
pub struct ExcelRequest {
    pub filename: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sheets: BTreeMap<String, Vec<ExportRow>>,
    /// Ask the renderer to also push the file to cloud storage.
    pub upload_drive: bool,
}

#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render_pdf(&self, payload: &DashboardPayload) -> Result<RenderedReport, RenderError>;

    async fn render_excel(&self, request: &ExcelRequest) -> Result<RenderedReport, RenderError>;
}

/// Renderer reached over HTTP: `POST {base}/pdf` and `POST {base}/excel`
/// with a JSON body, answered with the document bytes.
pub struct HttpReportRenderer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReportRenderer {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
        fallback_type: &str,
    ) -> Result<RenderedReport, RenderError> {
        let resp = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RenderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(fallback_type)
            .to_string();
        let bytes = resp.bytes().await?;
        Ok(RenderedReport {
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl ReportRenderer for HttpReportRenderer {
    async fn render_pdf(&self, payload: &DashboardPayload) -> Result<RenderedReport, RenderError> {
        self.post("pdf", payload, "application/pdf").await
    }

    async fn render_excel(&self, request: &ExcelRequest) -> Result<RenderedReport, RenderError> {
        self.post(
            "excel",
            request,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .await
    }
}
