use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::service::{HalaqahCapacityService, HalaqahError};
use crate::workflows::cohort::{CohortId, MemberId};
use crate::workflows::store::CohortStore;

#[derive(Debug, Default, Deserialize)]
pub struct CapacityQuery {
    pub viewer_id: Option<String>,
}

/// Public capacity endpoint used by both staff and members choosing a group.
pub fn halaqah_router<S>(service: Arc<HalaqahCapacityService<S>>) -> Router
where
    S: CohortStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/cohorts/:cohort_id/halaqah/capacity",
            get(capacity_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn capacity_handler<S>(
    State(service): State<Arc<HalaqahCapacityService<S>>>,
    Path(cohort_id): Path<String>,
    Query(query): Query<CapacityQuery>,
) -> Response
where
    S: CohortStore + 'static,
{
    let viewer = query
        .viewer_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(MemberId);

    match service.capacity(&CohortId(cohort_id), viewer.as_ref()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(HalaqahError::Persistence(source)) => {
            error!(error = %source, "halaqah capacity persistence failure");
            let payload = json!({
                "error": "persistence failure",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
