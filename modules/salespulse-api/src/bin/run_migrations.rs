//! Applies the embedded `webhooks` migrations and exits.
//!
//! Run as a deploy step before `salespulse-server`, which applies the same
//! migrations at startup but should not be the first to touch a new database.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connecting to DATABASE_URL")?;

    let migrator = sqlx::migrate!("../../migrations");
    info!(embedded = migrator.iter().count(), "Applying migrations");
    migrator
        .run(&pool)
        .await
        .context("applying migrations")?;

    info!("Migrations complete");
    Ok(())
}
