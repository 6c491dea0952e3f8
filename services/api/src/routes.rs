use crate::infra::{AppState, ScoringReadiness};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_scoring::scoring::{scoring_router, HistorySource, LoanScoringService, ModelStore};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_scoring_routes<S, H>(service: Arc<LoanScoringService<S, H>>) -> axum::Router
where
    S: ModelStore + 'static,
    H: HistorySource + 'static,
{
    scoring_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let listening = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let scoring = state.scoring.scoring_ready();

    let (status, payload) = match (listening, scoring) {
        (true, true) => (StatusCode::OK, json!({ "status": "ready" })),
        (false, _) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "initializing" }),
        ),
        (true, false) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "scoring_unavailable" }),
        ),
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use loan_scoring::scoring::{
        FileModelStore, HistoricalRecord, InMemoryModelStore, ModelLifecycle, TrainingSettings,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn in_memory_service() -> LoanScoringService<InMemoryModelStore, Vec<HistoricalRecord>> {
        LoanScoringService::new(ModelLifecycle::new(
            InMemoryModelStore::default(),
            Vec::<HistoricalRecord>::new(),
            TrainingSettings::default(),
        ))
    }

    fn router() -> axum::Router {
        with_scoring_routes(Arc::new(in_memory_service()))
    }

    fn app_state(listening: bool, scoring: Arc<dyn ScoringReadiness>) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(listening)),
            scoring,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn readiness_of(state: AppState) -> (StatusCode, serde_json::Value) {
        let response = readiness_endpoint(Extension(state)).await.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn scoring_routes_are_mounted_alongside_health() {
        let response = router()
            .oneshot(
                Request::post("/api/v1/loans/assessments")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"credit_score": 760, "annual_income": 90000}"#))
                    .expect("request builds"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);

        let response = router()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_once_listening_and_scorer_loaded() {
        let service = Arc::new(in_memory_service());
        service.warm_up().expect("rule-based scorer");

        let (status, body) = readiness_of(app_state(true, service)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn not_ready_while_listener_is_still_binding() {
        let service = Arc::new(in_memory_service());
        service.warm_up().expect("rule-based scorer");

        let (status, body) = readiness_of(app_state(false, service)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");
    }

    #[tokio::test]
    async fn not_ready_when_model_artifact_cannot_be_loaded() {
        let dir = std::env::temp_dir().join(format!(
            "loan-scoring-api-ready-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create dir");
        let artifact = dir.join("loan_approval_model.json");
        std::fs::write(&artifact, "{ truncated").expect("write artifact");

        let service = Arc::new(LoanScoringService::new(ModelLifecycle::new(
            FileModelStore::new(&artifact),
            Vec::<HistoricalRecord>::new(),
            TrainingSettings::default(),
        )));
        assert!(service.warm_up().is_err());

        let (status, body) = readiness_of(app_state(true, service)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "scoring_unavailable");
    }
}
