use crate::cli::ServeArgs;
use crate::infra::{build_scoring_service, AppState};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_scoring::config::AppConfig;
use loan_scoring::error::AppError;
use loan_scoring::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let scoring_service = Arc::new(build_scoring_service(&config.scoring));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        scoring: scoring_service.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // A failed warm-up is retried by the next request; /ready stays 503 until one succeeds.
    let warm_up_service = scoring_service.clone();
    match tokio::task::spawn_blocking(move || warm_up_service.warm_up()).await {
        Ok(Ok(status)) => info!(
            strategy = %status.strategy,
            training_records = status.training_records,
            "scoring model ready"
        ),
        Ok(Err(err)) => warn!(error = %err, "scoring model unavailable at startup"),
        Err(err) => warn!(error = %err, "scoring warm-up task failed"),
    }

    let app = with_scoring_routes(scoring_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
