use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::eligibility::{ApplicantFacts, EligibilityService};
use crate::records::domain::{
    Applicant, ApplicantId, ApplicantPatch, Criteria, CriteriaId, EducationLevel,
    EmploymentStatus, MaritalStatus, Relation, RelationKind, Scheme, SchemeId, SchemePatch, Sex,
};
use crate::records::memory::InMemoryStore;
use crate::records::repository::{ApplicantRepository, SchemeRepository, StoreError};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

/// Birth date giving exactly `age` completed years on [`as_of`].
pub(super) fn born_aged(age: i32) -> String {
    format!("{:04}-01-15", 2026 - age)
}

pub(super) fn person(name: &str, employment_status: EmploymentStatus, date_of_birth: &str) -> Applicant {
    Applicant {
        id: ApplicantId::generate(),
        name: name.to_string(),
        employment_status,
        sex: Sex::Female,
        date_of_birth: date_of_birth.to_string(),
    }
}

/// Stores a parent, optionally a spouse, and one child per entry in `child_births`.
pub(super) fn household(
    employment_status: EmploymentStatus,
    married: bool,
    child_births: &[String],
) -> (Arc<InMemoryStore>, ApplicantId) {
    let store = Arc::new(InMemoryStore::default());
    let parent = store
        .insert_applicant(person("Parent", employment_status, "1984-10-06"))
        .expect("parent stored");

    if married {
        let spouse = store
            .insert_applicant(person("Spouse", EmploymentStatus::Employed, "1983-04-02"))
            .expect("spouse stored");
        link(&store, parent.id, spouse.id, RelationKind::Spouse);
    }

    for (index, born) in child_births.iter().enumerate() {
        let child = store
            .insert_applicant(person(
                &format!("Child {index}"),
                EmploymentStatus::Unemployed,
                born,
            ))
            .expect("child stored");
        link(&store, parent.id, child.id, RelationKind::Child);
    }

    (store, parent.id)
}

pub(super) fn link(store: &InMemoryStore, from: ApplicantId, to: ApplicantId, kind: RelationKind) {
    store
        .insert_relation(Relation {
            id1: from,
            id2: to,
            relation: kind,
        })
        .expect("relation stored");
}

pub(super) fn criteria(
    marital_status: Option<MaritalStatus>,
    employment_status: Option<EmploymentStatus>,
    education_levels: Option<&[EducationLevel]>,
) -> Criteria {
    Criteria {
        id: CriteriaId::generate(),
        marital_status,
        employment_status,
        education_levels: education_levels.map(|levels| levels.iter().copied().collect()),
    }
}

pub(super) fn scheme(name: &str, criteria: Vec<Criteria>) -> Scheme {
    Scheme {
        id: SchemeId::generate(),
        name: name.to_string(),
        criteria,
        benefits: Vec::new(),
    }
}

pub(super) fn facts(
    marital_status: MaritalStatus,
    employment_status: EmploymentStatus,
    levels: &[EducationLevel],
) -> ApplicantFacts {
    ApplicantFacts {
        marital_status,
        employment_status,
        children_education_levels: levels.iter().copied().collect::<BTreeSet<_>>(),
    }
}

pub(super) fn with_catalog(store: &InMemoryStore, schemes: Vec<Scheme>) -> Vec<Scheme> {
    store.insert_schemes(schemes).expect("schemes stored")
}

pub(super) fn service(store: Arc<InMemoryStore>) -> EligibilityService<InMemoryStore> {
    EligibilityService::new(store)
}

/// Applicant data served from memory while every scheme lookup fails as if the backing
/// database had gone away.
pub(super) struct CatalogOffline {
    pub(super) applicants: InMemoryStore,
}

fn offline() -> StoreError {
    StoreError::Unavailable("scheme catalog offline".to_string())
}

impl ApplicantRepository for CatalogOffline {
    fn applicants(&self) -> Result<Vec<Applicant>, StoreError> {
        self.applicants.applicants()
    }

    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, StoreError> {
        self.applicants.applicant(id)
    }

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, StoreError> {
        self.applicants.insert_applicant(applicant)
    }

    fn update_applicant(
        &self,
        id: &ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, StoreError> {
        self.applicants.update_applicant(id, patch)
    }

    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), StoreError> {
        self.applicants.delete_applicant(id)
    }

    fn relations_from(
        &self,
        id: &ApplicantId,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>, StoreError> {
        self.applicants.relations_from(id, kind)
    }

    fn insert_relation(&self, relation: Relation) -> Result<Relation, StoreError> {
        self.applicants.insert_relation(relation)
    }
}

impl SchemeRepository for CatalogOffline {
    fn catalog(&self) -> Result<Vec<Scheme>, StoreError> {
        Err(offline())
    }

    fn scheme(&self, _id: &SchemeId) -> Result<Option<Scheme>, StoreError> {
        Err(offline())
    }

    fn insert_schemes(&self, _schemes: Vec<Scheme>) -> Result<Vec<Scheme>, StoreError> {
        Err(offline())
    }

    fn update_scheme(&self, _id: &SchemeId, _patch: SchemePatch) -> Result<Scheme, StoreError> {
        Err(offline())
    }

    fn delete_scheme(&self, _id: &SchemeId) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// Household from [`household`] behind a store whose catalog is unreachable.
pub(super) fn offline_catalog_household() -> (Arc<CatalogOffline>, ApplicantId) {
    let (store, parent) = household(EmploymentStatus::Unemployed, false, &[born_aged(8)]);
    let applicants = InMemoryStore::clone(&store);
    (Arc::new(CatalogOffline { applicants }), parent)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
