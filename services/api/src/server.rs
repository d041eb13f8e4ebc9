use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_lead_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_leads::config::AppConfig;
use loan_leads::error::AppError;
use loan_leads::leads::{cors_layer, LeadRelayService, SpreadsheetSink, SubmissionLog};
use loan_leads::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sink = Arc::new(SpreadsheetSink::from_config(&config.sink)?);
    let submission_log = Arc::new(SubmissionLog::new(config.audit.log_path.clone()));
    let lead_service = Arc::new(LeadRelayService::new(sink.clone(), submission_log));

    let mut app = with_lead_routes(lead_service, cors_layer(&config.cors)?);
    if let Some(site_dir) = &config.server.site_dir {
        app = app.fallback_service(ServeDir::new(site_dir));
    }
    let app = app.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sink = %sink.endpoint(),
        origin = %config.cors.allowed_origin,
        submission_log = %config.audit.log_path.display(),
        "loan lead relay ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
