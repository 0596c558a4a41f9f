use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingCacheInvalidator};
use crate::routes::with_cohort_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tikrar_pairing::config::AppConfig;
use tikrar_pairing::error::AppError;
use tikrar_pairing::telemetry;
use tikrar_pairing::workflows::access::HeaderAccessGuard;
use tikrar_pairing::workflows::cohort::{CohortCsvImporter, CohortId};
use tikrar_pairing::workflows::halaqah::HalaqahCapacityService;
use tikrar_pairing::workflows::pairing::PairingService;
use tikrar_pairing::workflows::store::InMemoryCohortStore;
use tracing::info;

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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryCohortStore::new());
    if let (Some(path), Some(cohort)) = (args.seed_csv.take(), args.cohort.take()) {
        let cohort_id = CohortId::new(cohort);
        let seed = CohortCsvImporter::from_path(&path, &cohort_id, Utc::now())?;
        info!(
            cohort = %cohort_id,
            members = seed.registrations.len(),
            path = %path.display(),
            "cohort roster preloaded"
        );
        store
            .seed_cohort(seed)
            .map_err(|err| AppError::Pairing(err.into()))?;
    }

    let pairing_service = Arc::new(PairingService::new(
        store.clone(),
        Arc::new(TracingCacheInvalidator),
        config.pairing.clone(),
    ));
    let halaqah_service = Arc::new(HalaqahCapacityService::new(store, config.halaqah));

    let app = with_cohort_routes(pairing_service, halaqah_service, Arc::new(HeaderAccessGuard))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tikrar pairing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
