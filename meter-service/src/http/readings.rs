use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use meter_store::{NewReading, Reading};
use serde::Deserialize;
use time::OffsetDateTime;

use super::{csv_response, ApiError, AppState};
use crate::csv_codec::{self, ImportSummary};
use crate::import;

#[derive(Deserialize)]
pub struct ReadingPayload {
    /// Defaults to the current time when omitted, like a form submission.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub kwh: f64,
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ReadingPayload>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    if !payload.kwh.is_finite() || payload.kwh < 0.0 {
        return Err(ApiError::Invalid("kwh must be a non-negative number".to_string()));
    }

    let new = NewReading {
        created_at: payload.created_at.unwrap_or_else(OffsetDateTime::now_utc),
        kwh: payload.kwh,
        description: payload.description.filter(|d| !d.is_empty()),
    };
    let reading = state.store.create_reading(new).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Reading>>, ApiError> {
    Ok(Json(state.store.list_readings().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Reading>, ApiError> {
    Ok(Json(state.store.get_reading(id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_reading(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    metrics::counter!("http_import_requests_total").increment(1);
    let summary = import::import_readings(state.store.as_ref(), &body).await?;
    Ok(Json(summary))
}

pub async fn export(State(state): State<AppState>) -> Result<Response, ApiError> {
    let readings = state.store.list_readings().await?;
    let doc = csv_codec::readings_to_csv(&readings)?;
    Ok(csv_response(doc))
}
