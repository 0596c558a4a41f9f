use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{PairingId, PairingTarget};
use super::service::{PairingError, PairingService};
use crate::workflows::access::{AccessError, AccessGuard, Actor};
use crate::workflows::cohort::{CohortId, MemberId};
use crate::workflows::store::{CacheInvalidator, CohortStore};

/// Shared state for the staff pairing endpoints.
pub struct PairingRouterState<S, C> {
    pub service: Arc<PairingService<S, C>>,
    pub guard: Arc<dyn AccessGuard>,
}

impl<S, C> Clone for PairingRouterState<S, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            guard: Arc::clone(&self.guard),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePairingRequest {
    pub first_member: String,
    pub second_member: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub member_id: String,
}

/// Router builder exposing the staff-only pairing endpoints.
pub fn pairing_router<S, C>(
    service: Arc<PairingService<S, C>>,
    guard: Arc<dyn AccessGuard>,
) -> Router
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    Router::new()
        .route(
            "/api/v1/cohorts/:cohort_id/allocations",
            post(allocate_handler::<S, C>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/pairings",
            post(create_handler::<S, C>).delete(delete_all_handler::<S, C>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/pairings/:pairing_id/members",
            post(add_member_handler::<S, C>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/members/:member_id/pairing",
            get(detail_handler::<S, C>).delete(delete_member_handler::<S, C>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/members/:member_id/matches",
            get(matches_handler::<S, C>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id/pairing-statistics",
            get(statistics_handler::<S, C>),
        )
        .with_state(PairingRouterState { service, guard })
}

pub(crate) fn access_error_response(error: AccessError) -> Response {
    let status = match error {
        AccessError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        AccessError::AuthorizationDenied => StatusCode::FORBIDDEN,
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) fn pairing_error_response(error: PairingError) -> Response {
    let status = match &error {
        PairingError::Validation(_) => StatusCode::BAD_REQUEST,
        PairingError::MemberNotFound(_)
        | PairingError::PairingNotFound(_)
        | PairingError::UnknownPairing(_) => StatusCode::NOT_FOUND,
        PairingError::Conflict(_) => StatusCode::CONFLICT,
        PairingError::EmptyPool { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PairingError::Persistence(source) => {
            error!(error = %source, "pairing persistence failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

/// Body rejections become the same JSON 400 the service uses for invalid input.
fn json_body<T>(payload: Result<axum::Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|axum::Json(body)| body)
        .map_err(|rejection| {
            pairing_error_response(PairingError::Validation(rejection.body_text()))
        })
}

fn admin<S, C>(state: &PairingRouterState<S, C>, headers: &HeaderMap) -> Result<Actor, Response> {
    state.guard.require_admin(headers).map_err(access_error_response)
}

pub(crate) async fn allocate_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path(cohort_id): Path<String>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    let actor = match admin(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .service
        .run_bulk_allocation(&CohortId(cohort_id), &actor.id)
    {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

pub(crate) async fn create_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path(cohort_id): Path<String>,
    payload: Result<axum::Json<CreatePairingRequest>, JsonRejection>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    let actor = match admin(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.service.create_pairing(
        &CohortId(cohort_id),
        MemberId::new(request.first_member.trim()),
        MemberId::new(request.second_member.trim()),
        &actor.id,
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

pub(crate) async fn add_member_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path((cohort_id, pairing_id)): Path<(String, String)>,
    payload: Result<axum::Json<AddMemberRequest>, JsonRejection>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    let actor = match admin(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.service.add_member(
        &CohortId(cohort_id),
        &PairingId(pairing_id),
        &MemberId::new(request.member_id.trim()),
        &actor.id,
    ) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

async fn delete_target<S, C>(
    state: PairingRouterState<S, C>,
    headers: HeaderMap,
    cohort_id: String,
    target: PairingTarget,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    let actor = match admin(&state, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .service
        .delete_pairing(&CohortId(cohort_id), &target, &actor.id)
    {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

pub(crate) async fn delete_all_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path(cohort_id): Path<String>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    delete_target(state, headers, cohort_id, PairingTarget::All).await
}

pub(crate) async fn delete_member_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path((cohort_id, member_id)): Path<(String, String)>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    let target = PairingTarget::from_path(&member_id);
    delete_target(state, headers, cohort_id, target).await
}

pub(crate) async fn detail_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path((cohort_id, member_id)): Path<(String, String)>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    if let Err(response) = admin(&state, &headers) {
        return response;
    }

    match state
        .service
        .pairing_detail(&CohortId(cohort_id), &MemberId(member_id))
    {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

pub(crate) async fn matches_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path((cohort_id, member_id)): Path<(String, String)>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    if let Err(response) = admin(&state, &headers) {
        return response;
    }

    match state
        .service
        .find_matches(&CohortId(cohort_id), &MemberId(member_id))
    {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => pairing_error_response(error),
    }
}

pub(crate) async fn statistics_handler<S, C>(
    State(state): State<PairingRouterState<S, C>>,
    headers: HeaderMap,
    Path(cohort_id): Path<String>,
) -> Response
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    if let Err(response) = admin(&state, &headers) {
        return response;
    }

    let cohort_id = CohortId(cohort_id);
    match state.service.statistics(&cohort_id) {
        Ok(statistics) => {
            let payload = json!({
                "cohort_id": cohort_id,
                "total": statistics.total(),
                "statistics": statistics,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => pairing_error_response(error),
    }
}
