use anyhow::Result;
use meter_service::{
    config::AppConfig,
    http::{self, AppState},
    metrics_server, observability,
};
use meter_store::PgStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.url)
        .await?;

    let store = PgStore::new(pool);
    store.ensure_schema().await?;

    let state = AppState {
        store: Arc::new(store),
        delta_policy: cfg.stats.negative_delta,
        auth_bearer_token: cfg.http.auth_bearer_token.clone(),
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "meter service listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
