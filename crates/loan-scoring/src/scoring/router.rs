use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use super::history::HistorySource;
use super::service::{LoanScoringService, ScoringServiceError};
use super::store::ModelStore;

/// Router builder exposing assessment and model status endpoints.
pub fn scoring_router<S, H>(service: Arc<LoanScoringService<S, H>>) -> Router
where
    S: ModelStore + 'static,
    H: HistorySource + 'static,
{
    Router::new()
        .route("/api/v1/loans/assessments", post(assess_handler::<S, H>))
        .route("/api/v1/loans/model", get(model_handler::<S, H>))
        .with_state(service)
}

pub(crate) async fn assess_handler<S, H>(
    State(service): State<Arc<LoanScoringService<S, H>>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    S: ModelStore + 'static,
    H: HistorySource + 'static,
{
    // A cold cell reads disk and may fit the forest while holding its lock.
    let outcome = tokio::task::spawn_blocking(move || service.assess_json(payload)).await;

    match outcome {
        Ok(Ok(assessment)) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Ok(Err(ScoringServiceError::InvalidPayload(reason))) => {
            let payload = json!({ "error": reason });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        // No score is better than one from a strategy that differs per request.
        Ok(Err(ScoringServiceError::Storage(error))) => unavailable(error.to_string()),
        Err(join_error) => unavailable(format!("scoring task failed: {join_error}")),
    }
}

pub(crate) async fn model_handler<S, H>(
    State(service): State<Arc<LoanScoringService<S, H>>>,
) -> Response
where
    S: ModelStore + 'static,
    H: HistorySource + 'static,
{
    match tokio::task::spawn_blocking(move || service.model_status()).await {
        Ok(Ok(status)) => (StatusCode::OK, axum::Json(status)).into_response(),
        Ok(Err(error)) => unavailable(error.to_string()),
        Err(join_error) => unavailable(format!("scoring task failed: {join_error}")),
    }
}

fn unavailable(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
}
