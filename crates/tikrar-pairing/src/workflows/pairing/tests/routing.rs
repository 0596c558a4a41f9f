use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::access::{HeaderAccessGuard, ACTOR_ID_HEADER, ACTOR_ROLES_HEADER};
use crate::workflows::cohort::MemberId;
use crate::workflows::pairing::router::{allocate_handler, PairingRouterState};
use crate::workflows::pairing::PairingService;
use crate::workflows::store::InMemoryCohortStore;

fn seeded_store() -> Arc<InMemoryCohortStore> {
    let store = Arc::new(InMemoryCohortStore::new());
    enroll(&store, "m-1", "WIB", "30A", "04-06", "");
    enroll(&store, "m-2", "WIB", "30A", "04-06", "");
    enroll(&store, "m-3", "WITA", "29A", "20-22", "");
    store
}

fn admin_request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(ACTOR_ID_HEADER, "staff-1")
        .header(ACTOR_ROLES_HEADER, "admin")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("request builds")
}

#[tokio::test]
async fn allocation_route_requires_authentication_and_admin() {
    let (service, _) = build_service(seeded_store());
    let router = router_for(service);

    let anonymous = router
        .clone()
        .oneshot(
            Request::post("/api/v1/cohorts/batch-2/allocations")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let member = router
        .oneshot(
            Request::post("/api/v1/cohorts/batch-2/allocations")
                .header(ACTOR_ID_HEADER, "m-1")
                .header(ACTOR_ROLES_HEADER, "thalibah")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(member.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn allocate_handler_returns_report() {
    let (service, _) = build_service(seeded_store());
    let state = PairingRouterState {
        service: Arc::new(service),
        guard: Arc::new(HeaderAccessGuard),
    };

    let cohort = Path("batch-2".to_string());
    let response = allocate_handler(State(state), admin_headers(), cohort).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("paired_count"), Some(&json!(1)));
    assert_eq!(payload.get("unpaired"), Some(&json!(["m-3"])));
    assert_eq!(
        payload["analysis"][0]["match_type"],
        json!("Priority 1: same zone + main slot + same unit")
    );
}

#[tokio::test]
async fn allocation_route_reports_empty_pool() {
    let store = Arc::new(InMemoryCohortStore::new());
    enroll(&store, "m-1", "WIB", "30A", "04-06", "");
    let (service, _) = build_service(store);

    let response = router_for(service)
        .oneshot(admin_request("POST", "/api/v1/cohorts/batch-2/allocations", Body::empty()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_route_returns_created_then_conflict() {
    let (service, _) = build_service(seeded_store());
    let router = router_for(service);
    let body = json!({ "first_member": "m-2", "second_member": "m-1" }).to_string();

    let created = router
        .clone()
        .oneshot(admin_request(
            "POST",
            "/api/v1/cohorts/batch-2/pairings",
            Body::from(body.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    assert_eq!(payload.get("first_member"), Some(&json!("m-1")));
    assert_eq!(payload.get("mechanism"), Some(&json!("manually_chosen")));

    let duplicate = router
        .oneshot(admin_request("POST", "/api/v1/cohorts/batch-2/pairings", Body::from(body)))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_route_rejects_self_pairing() {
    let (service, _) = build_service(seeded_store());
    let body = json!({ "first_member": "m-1", "second_member": "m-1" }).to_string();

    let response = router_for(service)
        .oneshot(admin_request("POST", "/api/v1/cohorts/batch-2/pairings", Body::from(body)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn incomplete_or_malformed_bodies_are_json_validation_errors() {
    let store = seeded_store();
    let (service, _) = build_service(store.clone());
    let record = service
        .create_pairing(&cohort(), MemberId::new("m-1"), MemberId::new("m-2"), &staff())
        .expect("pairing created");
    let router = router_for(service);

    let missing_member = json!({ "first_member": "m-3" }).to_string();
    let add_uri = format!("/api/v1/cohorts/batch-2/pairings/{}/members", record.id);
    let requests = [
        ("/api/v1/cohorts/batch-2/pairings".to_string(), missing_member),
        ("/api/v1/cohorts/batch-2/pairings".to_string(), "{not json".to_string()),
        (add_uri, json!({}).to_string()),
    ];

    for (uri, body) in requests {
        let response = router
            .clone()
            .oneshot(admin_request("POST", &uri, Body::from(body)))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let payload = read_json_body(response).await;
        assert!(payload["error"].is_string(), "{uri}");
    }
    assert!(!paired_flag(&store, "m-3"));
}

#[tokio::test]
async fn add_member_route_grows_pair_into_triad() {
    let store = seeded_store();
    let (service, _) = build_service(store.clone());
    let record = service
        .create_pairing(&cohort(), MemberId::new("m-1"), MemberId::new("m-2"), &staff())
        .expect("pairing created");
    let router = router_for(service);

    let uri = format!("/api/v1/cohorts/batch-2/pairings/{}/members", record.id);
    let response = router
        .clone()
        .oneshot(admin_request("POST", &uri, Body::from(json!({ "member_id": "m-3" }).to_string())))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("third_member"), Some(&json!("m-3")));

    let missing = router
        .oneshot(admin_request(
            "POST",
            "/api/v1/cohorts/batch-2/pairings/pair-unknown/members",
            Body::from(json!({ "member_id": "m-3" }).to_string()),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_routes_handle_single_member_and_all() {
    let store = seeded_store();
    let (service, _) = build_service(store.clone());
    service
        .create_pairing(&cohort(), MemberId::new("m-1"), MemberId::new("m-2"), &staff())
        .expect("pairing created");
    let router = router_for(service);

    let missing = router
        .clone()
        .oneshot(admin_request(
            "DELETE",
            "/api/v1/cohorts/batch-2/members/m-3/pairing",
            Body::empty(),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let all = router
        .clone()
        .oneshot(admin_request(
            "DELETE",
            "/api/v1/cohorts/batch-2/members/all/pairing",
            Body::empty(),
        ))
        .await
        .expect("route executes");
    assert_eq!(all.status(), StatusCode::OK);
    assert_eq!(read_json_body(all).await, json!({ "deleted_count": 1 }));

    let again = router
        .oneshot(admin_request("DELETE", "/api/v1/cohorts/batch-2/pairings", Body::empty()))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(again).await, json!({ "deleted_count": 0 }));
    assert!(!paired_flag(&store, "m-1"));
}

#[tokio::test]
async fn detail_and_match_routes_return_not_found_for_unknown_members() {
    let (service, _) = build_service(seeded_store());
    let router = router_for(service);

    for uri in [
        "/api/v1/cohorts/batch-2/members/ghost/pairing",
        "/api/v1/cohorts/batch-2/members/ghost/matches",
    ] {
        let response = router
            .clone()
            .oneshot(admin_request("GET", uri, Body::empty()))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn matches_route_returns_bands() {
    let (service, _) = build_service(seeded_store());

    let response = router_for(service)
        .oneshot(admin_request("GET", "/api/v1/cohorts/batch-2/members/m-1/matches", Body::empty()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total_matches"], json!(2));
    assert_eq!(payload["bands"]["perfect"][0]["member_id"], json!("m-2"));
    assert_eq!(payload["bands"]["perfect"][0]["main_slot"], json!("04-06"));
    assert_eq!(payload["bands"]["cross"][0]["member_id"], json!("m-3"));
}

#[tokio::test]
async fn statistics_route_summarises_preferences() {
    let (service, _) = build_service(seeded_store());

    let response = router_for(service)
        .oneshot(admin_request("GET", "/api/v1/cohorts/batch-2/pairing-statistics", Body::empty()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], json!(3));
    assert_eq!(payload["statistics"]["system_match"]["submitted"], json!(3));
}

#[tokio::test]
async fn persistence_failures_hide_store_details() {
    let service = PairingService::new(
        Arc::new(UnavailableStore),
        Arc::new(RecordingInvalidator::default()),
        pairing_config(),
    );

    let response = router_for(service)
        .oneshot(admin_request("GET", "/api/v1/cohorts/batch-2/pairing-statistics", Body::empty()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "persistence failure" })
    );
}
