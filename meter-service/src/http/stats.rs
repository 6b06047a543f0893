use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::chart::ChartData;
use crate::stats::{self, Bucketing, PeriodCost};

#[derive(Deserialize)]
pub struct ConsumptionQuery {
    /// Optional aggregation bucket; without it the raw per-reading delta
    /// series is returned.
    pub bucket: Option<Bucketing>,
}

pub async fn consumption(
    State(state): State<AppState>,
    Query(query): Query<ConsumptionQuery>,
) -> Result<Json<ChartData>, ApiError> {
    let readings = state.store.list_readings().await?;
    let series = match query.bucket {
        Some(bucketing) => stats::bucket_deltas(&readings, bucketing, state.delta_policy),
        None => stats::delta_series(&readings, state.delta_policy),
    };
    Ok(Json(ChartData::from_series(series)))
}

pub async fn receipt_amounts(State(state): State<AppState>) -> Result<Json<ChartData>, ApiError> {
    let receipts = state.store.list_receipts().await?;
    Ok(Json(ChartData::from_series(stats::receipt_totals(&receipts))))
}

pub async fn period_costs(
    State(state): State<AppState>,
) -> Result<Json<Vec<PeriodCost>>, ApiError> {
    let readings = state.store.list_readings().await?;
    let receipts = state.store.list_receipts().await?;
    Ok(Json(stats::period_costs(&readings, &receipts, state.delta_policy)))
}
