use std::sync::Arc;

use tracing::info;

use super::domain::{
    Applicant, ApplicantDraft, ApplicantId, ApplicantPatch, Application, ApplicationDraft,
    ApplicationId, ApplicationPatch, Benefit, BenefitId, Criteria, CriteriaId, Relation, Scheme,
    SchemeId, SchemePatch, SchemesRequest,
};
use super::repository::{RecordStore, StoreError};
use crate::eligibility::parse_birth_date;

/// Intake, listing, patching and removal of stored records.
pub struct RecordsService<S> {
    store: Arc<S>,
}

fn require_name(name: &str, record: &str) -> Result<(), RecordsError> {
    if name.trim().is_empty() {
        return Err(RecordsError::InvalidPayload(format!("{record} name is required")));
    }
    Ok(())
}

fn require_birth_date(raw: &str) -> Result<(), RecordsError> {
    parse_birth_date(raw)
        .map(|_| ())
        .map_err(|err| RecordsError::InvalidPayload(format!("date_of_birth: {err}")))
}

impl<S> RecordsService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn applicants(&self) -> Result<Vec<Applicant>, RecordsError> {
        Ok(self.store.applicants()?)
    }

    pub fn create_applicant(&self, draft: ApplicantDraft) -> Result<Applicant, RecordsError> {
        require_name(&draft.name, "applicant")?;
        require_birth_date(&draft.date_of_birth)?;

        let applicant = Applicant {
            id: ApplicantId::generate(),
            name: draft.name.trim().to_string(),
            employment_status: draft.employment_status,
            sex: draft.sex,
            date_of_birth: draft.date_of_birth.trim().to_string(),
        };
        let stored = self.store.insert_applicant(applicant)?;
        info!(applicant = %stored.id, "applicant created");
        Ok(stored)
    }

    pub fn update_applicant(
        &self,
        id: &ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, RecordsError> {
        if patch.is_empty() {
            return Err(RecordsError::EmptyPatch);
        }
        if let Some(name) = &patch.name {
            require_name(name, "applicant")?;
        }
        if let Some(date_of_birth) = &patch.date_of_birth {
            require_birth_date(date_of_birth)?;
        }
        Ok(self.store.update_applicant(id, patch)?)
    }

    pub fn delete_applicant(&self, id: &ApplicantId) -> Result<(), RecordsError> {
        self.store.delete_applicant(id)?;
        info!(applicant = %id, "applicant deleted");
        Ok(())
    }

    pub fn relations(&self, id: &ApplicantId) -> Result<Vec<Relation>, RecordsError> {
        Ok(self.store.relations_from(id, None)?)
    }

    pub fn add_relation(&self, relation: Relation) -> Result<Relation, RecordsError> {
        if relation.id1 == relation.id2 {
            return Err(RecordsError::InvalidPayload(
                "an applicant cannot be related to themselves".to_string(),
            ));
        }
        Ok(self.store.insert_relation(relation)?)
    }

    pub fn schemes(&self) -> Result<Vec<Scheme>, RecordsError> {
        Ok(self.store.catalog()?)
    }

    pub fn scheme(&self, id: &SchemeId) -> Result<Scheme, RecordsError> {
        Ok(self.store.scheme(id)?.ok_or(StoreError::NotFound)?)
    }

    /// Creates every scheme in the request or none of them. Each criteria entry becomes a
    /// new criteria row even when an identical one already exists.
    pub fn create_schemes(&self, request: SchemesRequest) -> Result<Vec<Scheme>, RecordsError> {
        if request.schemes.is_empty() {
            return Err(RecordsError::InvalidPayload(
                "at least one scheme is required".to_string(),
            ));
        }

        let mut schemes = Vec::with_capacity(request.schemes.len());
        for draft in request.schemes {
            require_name(&draft.name, "scheme")?;

            let criteria = draft
                .criteria
                .into_iter()
                .map(|criteria| Criteria {
                    id: CriteriaId::generate(),
                    marital_status: criteria.marital_status,
                    employment_status: criteria.employment_status,
                    education_levels: criteria.education_levels,
                })
                .collect();

            let mut benefits = Vec::with_capacity(draft.benefits.len());
            for benefit in draft.benefits {
                require_name(&benefit.name, "benefit")?;
                if !benefit.amount.is_finite() || benefit.amount < 0.0 {
                    return Err(RecordsError::InvalidPayload(format!(
                        "benefit '{}' amount must be a non-negative number",
                        benefit.name
                    )));
                }
                benefits.push(Benefit {
                    id: benefit.id.unwrap_or_else(BenefitId::generate),
                    name: benefit.name.trim().to_string(),
                    amount: (benefit.amount * 100.0).round() / 100.0,
                });
            }

            schemes.push(Scheme {
                id: draft.id.unwrap_or_else(SchemeId::generate),
                name: draft.name.trim().to_string(),
                criteria,
                benefits,
            });
        }

        let stored = self.store.insert_schemes(schemes)?;
        info!(count = stored.len(), "schemes created");
        Ok(stored)
    }

    pub fn update_scheme(&self, id: &SchemeId, patch: SchemePatch) -> Result<Scheme, RecordsError> {
        if patch.is_empty() {
            return Err(RecordsError::EmptyPatch);
        }
        if let Some(name) = &patch.name {
            require_name(name, "scheme")?;
        }
        Ok(self.store.update_scheme(id, patch)?)
    }

    pub fn delete_scheme(&self, id: &SchemeId) -> Result<(), RecordsError> {
        self.store.delete_scheme(id)?;
        info!(scheme = %id, "scheme deleted");
        Ok(())
    }

    pub fn applications(&self) -> Result<Vec<Application>, RecordsError> {
        Ok(self.store.applications()?)
    }

    pub fn create_application(
        &self,
        draft: ApplicationDraft,
    ) -> Result<Application, RecordsError> {
        let application = Application {
            id: ApplicationId::generate(),
            applicant_id: draft.applicant_id,
            scheme_id: draft.scheme_id,
            status: draft.status,
        };
        let stored = self.store.insert_application(application)?;
        info!(application = %stored.id, scheme = %stored.scheme_id, "application created");
        Ok(stored)
    }

    pub fn update_application(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, RecordsError> {
        if patch.is_empty() {
            return Err(RecordsError::EmptyPatch);
        }
        Ok(self.store.update_application(id, patch)?)
    }

    pub fn delete_application(&self, id: &ApplicationId) -> Result<(), RecordsError> {
        self.store.delete_application(id)?;
        Ok(())
    }
}

/// Error raised by the records service.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),
    #[error("no fields to update")]
    EmptyPatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}
