use anyhow::{bail, Result};
use meter_service::{config::AppConfig, import, observability};
use meter_store::PgStore;
use sqlx::postgres::PgPoolOptions;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: import_readings <csv_file_path>");
    }
    let file_path = &args[1];

    // Load configuration (can point METER_CONFIG to a backfill-specific file).
    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.url)
        .await?;

    let store = PgStore::new(pool);
    store.ensure_schema().await?;

    let csv_text = std::fs::read_to_string(file_path)?;
    let summary = import::import_readings(&store, &csv_text).await?;

    for err in &summary.errors {
        tracing::warn!(row = err.row, reason = %err.reason, detail = %err.detail, "row rejected");
    }
    tracing::info!(
        inserted = summary.inserted,
        rejected = summary.rejected,
        "csv backfill finished"
    );

    Ok(())
}
