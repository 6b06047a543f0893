use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use meter_store::{NewReceipt, Receipt};
use serde::Deserialize;
use time::Date;

use super::{csv_response, ApiError, AppState};
use crate::csv_codec::{self, ImportSummary};
use crate::import;

#[derive(Deserialize)]
pub struct ReceiptPayload {
    pub period_start: Date,
    pub period_end: Date,
    pub amount: f64,
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ReceiptPayload>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    if payload.period_end <= payload.period_start {
        return Err(ApiError::Invalid(
            "period_end must be after period_start".to_string(),
        ));
    }
    if !payload.amount.is_finite() || payload.amount < 0.0 {
        return Err(ApiError::Invalid("amount must be a non-negative number".to_string()));
    }

    let new = NewReceipt {
        period_start: payload.period_start,
        period_end: payload.period_end,
        amount: payload.amount,
        notes: payload.notes.filter(|n| !n.is_empty()),
    };
    let receipt = state.store.create_receipt(new).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Receipt>>, ApiError> {
    Ok(Json(state.store.list_receipts().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Receipt>, ApiError> {
    Ok(Json(state.store.get_receipt(id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_receipt(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    metrics::counter!("http_import_requests_total").increment(1);
    let summary = import::import_receipts(state.store.as_ref(), &body).await?;
    Ok(Json(summary))
}

pub async fn export(State(state): State<AppState>) -> Result<Response, ApiError> {
    let receipts = state.store.list_receipts().await?;
    let doc = csv_codec::receipts_to_csv(&receipts)?;
    Ok(csv_response(doc))
}
