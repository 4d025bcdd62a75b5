use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::service::EligibilityService;
use crate::records::domain::{
    ApplicantId, EducationLevel, EmploymentStatus, MaritalStatus, Scheme, SchemeId,
};
use crate::records::repository::{ApplicantRepository, SchemeRepository};

#[derive(Debug, Default, Deserialize)]
pub struct EligibilityQuery {
    #[serde(default)]
    pub applicant: Option<String>,
    /// Evaluation date (YYYY-MM-DD); defaults to today.
    #[serde(default)]
    pub as_of: Option<String>,
}

/// Public shape of an eligible scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleSchemeView {
    pub id: SchemeId,
    pub name: String,
}

impl From<Scheme> for EligibleSchemeView {
    fn from(scheme: Scheme) -> Self {
        Self {
            id: scheme.id,
            name: scheme.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFactsView {
    pub id: ApplicantId,
    pub as_of: NaiveDate,
    pub marital_status: MaritalStatus,
    pub employment_status: EmploymentStatus,
    pub children_education_levels: BTreeSet<EducationLevel>,
}

/// Router builder exposing eligibility evaluation over HTTP.
pub fn eligibility_router<S>(service: Arc<EligibilityService<S>>) -> Router
where
    S: ApplicantRepository + SchemeRepository + 'static,
{
    Router::new()
        .route("/api/schemes/eligible", get(eligible_handler::<S>))
        .route("/api/applicants/facts", get(facts_handler::<S>))
        .with_state(service)
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, axum::Json(json!({ "error": message }))).into_response()
}

fn parse_query(query: EligibilityQuery) -> Result<(ApplicantId, NaiveDate), Response> {
    let raw_id = query
        .applicant
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| bad_request("applicant ID is required".to_string()))?;
    let applicant_id = raw_id
        .parse::<ApplicantId>()
        .map_err(|err| bad_request(format!("invalid applicant ID '{raw_id}': {err}")))?;

    let as_of = match query.as_of {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|err| bad_request(format!("invalid as_of '{raw}': {err}")))?,
        None => Local::now().date_naive(),
    };

    Ok((applicant_id, as_of))
}

fn evaluation_failure(err: super::EligibilityError) -> Response {
    error!(error = %err, "eligibility evaluation failed");
    let payload = json!({ "error": err.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}

pub(crate) async fn eligible_handler<S>(
    State(service): State<Arc<EligibilityService<S>>>,
    Query(query): Query<EligibilityQuery>,
) -> Response
where
    S: ApplicantRepository + SchemeRepository + 'static,
{
    let (applicant_id, as_of) = match parse_query(query) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match service.eligible_schemes(&applicant_id, as_of) {
        Ok(schemes) => {
            let views: Vec<EligibleSchemeView> =
                schemes.into_iter().map(EligibleSchemeView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => evaluation_failure(err),
    }
}

pub(crate) async fn facts_handler<S>(
    State(service): State<Arc<EligibilityService<S>>>,
    Query(query): Query<EligibilityQuery>,
) -> Response
where
    S: ApplicantRepository + SchemeRepository + 'static,
{
    let (applicant_id, as_of) = match parse_query(query) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match service.facts(&applicant_id, as_of) {
        Ok(facts) => {
            let view = ApplicantFactsView {
                id: applicant_id,
                as_of,
                marital_status: facts.marital_status,
                employment_status: facts.employment_status,
                children_education_levels: facts.children_education_levels,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => evaluation_failure(err),
    }
}
