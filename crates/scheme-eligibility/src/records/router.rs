use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicantDraft, ApplicantId, ApplicantPatch, ApplicationDraft, ApplicationId,
    ApplicationPatch, Relation, SchemeId, SchemePatch, SchemesRequest,
};
use super::repository::{RecordStore, StoreError};
use super::service::{RecordsError, RecordsService};

/// Query parameters addressing a single record, e.g. `?applicant=<id>`.
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub applicant: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
}

/// Router builder exposing CRUD endpoints for applicants, relations, schemes and applications.
pub fn records_router<S>(service: Arc<RecordsService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route(
            "/api/applicants",
            get(list_applicants::<S>)
                .post(create_applicant::<S>)
                .put(update_applicant::<S>)
                .delete(delete_applicant::<S>),
        )
        .route(
            "/api/relations",
            get(list_relations::<S>).post(create_relation::<S>),
        )
        .route(
            "/api/schemes",
            get(list_schemes::<S>)
                .post(create_schemes::<S>)
                .put(update_scheme::<S>)
                .delete(delete_scheme::<S>),
        )
        .route(
            "/api/applications",
            get(list_applications::<S>)
                .post(create_application::<S>)
                .put(update_application::<S>)
                .delete(delete_application::<S>),
        )
        .with_state(service)
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

fn required_id<T>(raw: Option<String>, label: &str) -> Result<T, Response>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| error_body(StatusCode::BAD_REQUEST, format!("{label} ID is required")))?;
    raw.parse::<T>().map_err(|err| {
        error_body(
            StatusCode::BAD_REQUEST,
            format!("invalid {label} ID '{raw}': {err}"),
        )
    })
}

/// Malformed or unparseable JSON bodies are client errors, reported like any other.
fn payload<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|axum::Json(value)| value).map_err(|rejection| {
        error_body(
            StatusCode::BAD_REQUEST,
            format!("invalid request payload: {}", rejection.body_text()),
        )
    })
}

fn records_failure(err: RecordsError) -> Response {
    let status = match &err {
        RecordsError::InvalidPayload(_) | RecordsError::EmptyPatch => StatusCode::BAD_REQUEST,
        RecordsError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        RecordsError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        RecordsError::Store(StoreError::MissingReference(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        RecordsError::Store(StoreError::Unavailable(_) | StoreError::Corrupt(_)) => {
            error!(error = %err, "record store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, err.to_string())
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, RecordsError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(err) => records_failure(err),
    }
}

fn deleted(result: Result<(), RecordsError>, message: &str) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "message": message }))).into_response(),
        Err(err) => records_failure(err),
    }
}

pub(crate) async fn list_applicants<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
) -> Response {
    respond(StatusCode::OK, service.applicants())
}

pub(crate) async fn create_applicant<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    body: Result<axum::Json<ApplicantDraft>, JsonRejection>,
) -> Response {
    let draft = match payload(body) {
        Ok(draft) => draft,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create_applicant(draft))
}

pub(crate) async fn update_applicant<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
    body: Result<axum::Json<ApplicantPatch>, JsonRejection>,
) -> Response {
    let patch = match payload(body) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    let id: ApplicantId = match required_id(query.applicant, "applicant") {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_applicant(&id, patch))
}

pub(crate) async fn delete_applicant<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Response {
    let id: ApplicantId = match required_id(query.applicant, "applicant") {
        Ok(id) => id,
        Err(response) => return response,
    };
    deleted(
        service.delete_applicant(&id),
        "Applicant deleted successfully",
    )
}

pub(crate) async fn list_relations<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Response {
    let id: ApplicantId = match required_id(query.applicant, "applicant") {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.relations(&id))
}

pub(crate) async fn create_relation<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    body: Result<axum::Json<Relation>, JsonRejection>,
) -> Response {
    let relation = match payload(body) {
        Ok(relation) => relation,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.add_relation(relation))
}

/// Whole catalog, or a single scheme when `?scheme=` is given.
pub(crate) async fn list_schemes<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Response {
    if query.scheme.is_none() {
        return respond(StatusCode::OK, service.schemes());
    }
    let id: SchemeId = match required_id(query.scheme, "scheme") {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.scheme(&id))
}

pub(crate) async fn create_schemes<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    body: Result<axum::Json<SchemesRequest>, JsonRejection>,
) -> Response {
    let request = match payload(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create_schemes(request))
}

pub(crate) async fn update_scheme<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
    body: Result<axum::Json<SchemePatch>, JsonRejection>,
) -> Response {
    let patch = match payload(body) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    let id: SchemeId = match required_id(query.scheme, "scheme") {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_scheme(&id, patch))
}

pub(crate) async fn delete_scheme<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Response {
    let id: SchemeId = match required_id(query.scheme, "scheme") {
        Ok(id) => id,
        Err(response) => return response,
    };
    deleted(
        service.delete_scheme(&id),
        "Scheme and associated data deleted successfully",
    )
}

pub(crate) async fn list_applications<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
) -> Response {
    respond(StatusCode::OK, service.applications())
}

pub(crate) async fn create_application<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    body: Result<axum::Json<ApplicationDraft>, JsonRejection>,
) -> Response {
    let draft = match payload(body) {
        Ok(draft) => draft,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create_application(draft))
}

pub(crate) async fn update_application<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
    body: Result<axum::Json<ApplicationPatch>, JsonRejection>,
) -> Response {
    let patch = match payload(body) {
        Ok(patch) => patch,
        Err(response) => return response,
    };
    let id: ApplicationId = match required_id(query.application, "application") {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_application(&id, patch))
}

pub(crate) async fn delete_application<S: RecordStore + 'static>(
    State(service): State<Arc<RecordsService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Response {
    let id: ApplicationId = match required_id(query.application, "application") {
        Ok(id) => id,
        Err(response) => return response,
    };
    deleted(
        service.delete_application(&id),
        "Application deleted successfully",
    )
}
