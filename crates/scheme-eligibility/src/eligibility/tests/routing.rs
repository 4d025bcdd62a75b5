use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::eligibility::{eligibility_router, EligibilityService};
use crate::records::domain::{ApplicantId, EducationLevel, EmploymentStatus};
use crate::records::memory::InMemoryStore;

fn get(uri: String) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn eligible_route_lists_matching_schemes() {
    let (store, parent) = household(EmploymentStatus::Unemployed, false, &[born_aged(6)]);
    let catalog = with_catalog(
        &store,
        vec![
            scheme(
                "Retrenchment Assistance Scheme",
                vec![criteria(None, Some(EmploymentStatus::Unemployed), None)],
            ),
            scheme(
                "Primary Support",
                vec![criteria(None, None, Some(&[EducationLevel::Primary]))],
            ),
        ],
    );
    let router = eligibility_router(Arc::new(service(store)));

    let response = router
        .oneshot(get(format!(
            "/api/schemes/eligible?applicant={parent}&as_of=2026-10-18"
        )))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let schemes = payload.as_array().expect("array payload");
    assert_eq!(schemes.len(), 1);
    assert_eq!(schemes[0]["id"], catalog[0].id.to_string());
    assert_eq!(schemes[0]["name"], "Retrenchment Assistance Scheme");
}

#[tokio::test]
async fn eligible_route_requires_applicant() {
    let router = eligibility_router(Arc::new(service(Arc::new(InMemoryStore::default()))));

    let response = router
        .oneshot(get("/api/schemes/eligible".to_string()))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "applicant ID is required");
}

#[tokio::test]
async fn eligible_route_rejects_malformed_applicant() {
    let router = eligibility_router(Arc::new(service(Arc::new(InMemoryStore::default()))));

    let response = router
        .oneshot(get("/api/schemes/eligible?applicant=not-a-uuid".to_string()))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("not-a-uuid"));
}

#[tokio::test]
async fn eligible_route_rejects_bad_as_of() {
    let (store, parent) = household(EmploymentStatus::Employed, false, &[]);
    let router = eligibility_router(Arc::new(service(store)));

    let response = router
        .oneshot(get(format!(
            "/api/schemes/eligible?applicant={parent}&as_of=18-10-2026"
        )))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eligible_route_fails_for_unknown_applicant() {
    let router = eligibility_router(Arc::new(service(Arc::new(InMemoryStore::default()))));
    let missing = ApplicantId::generate();

    let response = router
        .oneshot(get(format!("/api/schemes/eligible?applicant={missing}")))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], format!("applicant {missing} not found"));
}

#[tokio::test]
async fn facts_route_reports_derived_facts() {
    let (store, parent) = household(
        EmploymentStatus::Unemployed,
        true,
        &[born_aged(9), born_aged(20)],
    );
    let router = eligibility_router(Arc::new(service(store)));

    let response = router
        .oneshot(get(format!(
            "/api/applicants/facts?applicant={parent}&as_of=2026-10-18"
        )))
        .await
        .expect("facts response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], parent.to_string());
    assert_eq!(payload["as_of"], "2026-10-18");
    assert_eq!(payload["marital_status"], "married");
    assert_eq!(payload["employment_status"], "unemployed");
    assert_eq!(
        payload["children_education_levels"],
        serde_json::json!(["primary", "higher"])
    );
}

#[tokio::test]
async fn eligible_route_reports_unavailable_store() {
    let (store, parent) = offline_catalog_household();
    let router = eligibility_router(Arc::new(EligibilityService::new(store)));

    let response = router
        .oneshot(get(format!(
            "/api/schemes/eligible?applicant={parent}&as_of=2026-10-18"
        )))
        .await
        .expect("eligible response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("scheme catalog offline"));
}
