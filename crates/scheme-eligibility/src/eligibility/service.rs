use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::facts::{ApplicantFacts, FactDeriver};
use super::matcher::find_eligible_schemes;
use super::EligibilityError;
use crate::records::domain::{ApplicantId, Scheme};
use crate::records::repository::{ApplicantRepository, SchemeRepository};

/// Service composing the record store, fact deriver, and matcher.
pub struct EligibilityService<S> {
    store: Arc<S>,
    deriver: FactDeriver<S>,
}

impl<S> EligibilityService<S>
where
    S: ApplicantRepository + SchemeRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        let deriver = FactDeriver::new(store.clone());
        Self { store, deriver }
    }

    /// Derive the facts for a stored applicant as of the given date.
    pub fn facts(
        &self,
        applicant_id: &ApplicantId,
        as_of: NaiveDate,
    ) -> Result<ApplicantFacts, EligibilityError> {
        let applicant = self
            .store
            .applicant(applicant_id)?
            .ok_or(EligibilityError::ApplicantNotFound(*applicant_id))?;
        self.deriver.derive(&applicant, as_of)
    }

    /// Schemes the applicant qualifies for, in catalog order.
    pub fn eligible_schemes(
        &self,
        applicant_id: &ApplicantId,
        as_of: NaiveDate,
    ) -> Result<Vec<Scheme>, EligibilityError> {
        let facts = self.facts(applicant_id, as_of)?;
        debug!(applicant = %applicant_id, ?facts, "derived applicant facts");

        let catalog = self.store.catalog()?;
        let eligible: Vec<Scheme> = find_eligible_schemes(&facts, &catalog)
            .into_iter()
            .cloned()
            .collect();

        info!(
            applicant = %applicant_id,
            %as_of,
            eligible = eligible.len(),
            catalog = catalog.len(),
            "evaluated scheme eligibility"
        );
        Ok(eligible)
    }
}
