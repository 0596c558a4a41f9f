use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tikrar_pairing::workflows::access::AccessGuard;
use tikrar_pairing::workflows::halaqah::{halaqah_router, HalaqahCapacityService};
use tikrar_pairing::workflows::pairing::{pairing_router, PairingService};
use tikrar_pairing::workflows::store::{CacheInvalidator, CohortStore};

pub(crate) fn with_cohort_routes<S, C>(
    pairing: Arc<PairingService<S, C>>,
    halaqah: Arc<HalaqahCapacityService<S>>,
    guard: Arc<dyn AccessGuard>,
) -> Router
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    pairing_router(pairing, guard)
        .merge(halaqah_router(halaqah))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };

    (status, Json(json!({ "status": label })))
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
    use crate::infra::TracingCacheInvalidator;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tikrar_pairing::config::{HalaqahConfig, PairingConfig};
    use tikrar_pairing::workflows::access::HeaderAccessGuard;
    use tikrar_pairing::workflows::cohort::{CohortCsvImporter, CohortId};
    use tikrar_pairing::workflows::store::InMemoryCohortStore;
    use tower::ServiceExt;

    const ROSTER: &str = "member_id,full_name,timezone,chosen_unit,main_time_slot,exam_group_id\n\
m-1,Aisyah,WIB,30A,04-06,h-1\n\
m-2,Fatimah,WIB,30A,04-06,h-1\n";

    fn app(ready: bool) -> Router {
        let store = Arc::new(InMemoryCohortStore::new());
        let seed = CohortCsvImporter::from_reader(
            ROSTER.as_bytes(),
            &CohortId::new("batch-2"),
            Utc::now(),
        )
        .expect("roster parses");
        store.seed_cohort(seed).expect("seeded");

        let pairing = Arc::new(PairingService::new(
            store.clone(),
            Arc::new(TracingCacheInvalidator),
            PairingConfig::default(),
        ));
        let halaqah = Arc::new(HalaqahCapacityService::new(store, HalaqahConfig::default()));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        with_cohort_routes(pairing, halaqah, Arc::new(HeaderAccessGuard)).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let request = Request::get("/ready").body(Body::empty()).expect("request");
        let response = app(false).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let request = Request::get("/ready").body(Body::empty()).expect("request");
        let response = app(true).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn merged_router_serves_pairing_and_capacity_routes() {
        let request = Request::get("/api/v1/cohorts/batch-2/halaqah/capacity")
            .body(Body::empty())
            .expect("request");
        let response = app(true).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::post("/api/v1/cohorts/batch-2/allocations")
            .body(Body::empty())
            .expect("request");
        let response = app(true).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
