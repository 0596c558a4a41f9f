use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tikrar_pairing::workflows::cohort::CohortId;
use tikrar_pairing::workflows::store::{CacheInvalidator, CachedView, InvalidationError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// There is no rendered-page cache in front of this service yet, so invalidations are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingCacheInvalidator;

impl CacheInvalidator for TracingCacheInvalidator {
    fn invalidate(
        &self,
        cohort_id: &CohortId,
        views: &[CachedView],
    ) -> Result<(), InvalidationError> {
        info!(cohort = %cohort_id, ?views, "cached views invalidated");
        Ok(())
    }
}
