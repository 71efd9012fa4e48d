use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salespulse_adapters::{AdapterRegistry, Coordinator};
use salespulse_analytics::AggregationEngine;
use salespulse_api::renderer::{HttpReportRenderer, ReportRenderer};
use salespulse_api::{build_router, AppState};
use salespulse_common::AppConfig;
use salespulse_store::{PgRecordStore, RecordStore};

#[derive(Parser)]
#[command(name = "salespulse-server", about = "Sales webhook ingestion and dashboard API")]
struct Cli {
    /// Bind address (overrides HOST)
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    let config = Arc::new(config);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    info!(max_connections = config.db_max_connections, "Connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Migrations complete");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let coordinator = Coordinator::new(Arc::new(AdapterRegistry::default()), store.clone(), &config);
    let engine = AggregationEngine::new(store.clone());
    let renderer = config.report_renderer_url.as_ref().map(|url| {
        Arc::new(HttpReportRenderer::new(url.clone(), http_client.clone())) as Arc<dyn ReportRenderer>
    });

    let state = Arc::new(
        AppState::builder()
            .config(config.clone())
            .store(store)
            .coordinator(coordinator)
            .engine(engine)
            .http_client(http_client)
            .renderer(renderer)
            .build(),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("SalesPulse API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
