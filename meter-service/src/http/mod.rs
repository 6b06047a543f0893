mod readings;
mod receipts;
mod stats;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meter_store::{Store, StoreError};

use crate::csv_codec::CsvError;
use crate::import::ImportError;
use crate::stats::DeltaPolicy;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub delta_policy: DeltaPolicy,
    pub auth_bearer_token: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), require_bearer);

    Router::new()
        .route("/readings", get(readings::list).post(readings::create))
        .route("/readings/import", post(readings::import))
        .route("/readings/export.csv", get(readings::export))
        .route("/readings/:id", get(readings::get_one).delete(readings::delete))
        .route("/receipts", get(receipts::list).post(receipts::create))
        .route("/receipts/import", post(receipts::import))
        .route("/receipts/export.csv", get(receipts::export))
        .route("/receipts/:id", get(receipts::get_one).delete(receipts::delete))
        .route("/stats/consumption", get(stats::consumption))
        .route("/stats/receipts", get(stats::receipt_amounts))
        .route("/stats/periods", get(stats::period_costs))
        .layer(auth)
        .with_state(state)
}

/// Static bearer token check. Auth is an external concern; when no token is
/// configured every request passes through.
async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = &state.auth_bearer_token {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| token == expected)
            .unwrap_or(false);

        if !authorized {
            metrics::counter!("http_unauthorized_total").increment(1);
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    Csv(CsvError),
    Invalid(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<CsvError> for ApiError {
    fn from(e: CsvError) -> Self {
        Self::Csv(e)
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Csv(e) => Self::Csv(e),
            ImportError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::Store(StoreError::Persistence(e)) => {
                tracing::error!(error = %e, "persistence error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "persistence error".to_string(),
                )
            }
            Self::Csv(e @ CsvError::SchemaMismatch { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            Self::Csv(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Invalid(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], body).into_response()
}
