use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::EligibilityError;
use crate::records::domain::{
    Applicant, ApplicantId, EducationLevel, EmploymentStatus, MaritalStatus, RelationKind,
};
use crate::records::repository::ApplicantRepository;

/// Applicant attributes the matcher evaluates criteria against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFacts {
    pub marital_status: MaritalStatus,
    pub employment_status: EmploymentStatus,
    pub children_education_levels: BTreeSet<EducationLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BirthDateError {
    #[error("'{0}' is not a YYYY-MM-DD date or RFC 3339 timestamp")]
    Unparseable(String),
    #[error("born {born}, which is after {as_of}")]
    InFuture { born: NaiveDate, as_of: NaiveDate },
}

/// Accepts plain dates and RFC 3339 timestamps; a timestamp contributes its date part.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, BirthDateError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|stamp| stamp.date_naive()))
        .map_err(|_| BirthDateError::Unparseable(raw.to_string()))
}

/// Whole years elapsed between `born` and `as_of`. The year only counts once the
/// month/day of birth has been reached.
pub fn age_on(born: NaiveDate, as_of: NaiveDate) -> Result<u32, BirthDateError> {
    if born > as_of {
        return Err(BirthDateError::InFuture { born, as_of });
    }
    let mut years = as_of.year() - born.year();
    if (as_of.month(), as_of.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    Ok(years.unsigned_abs())
}

/// Derives [`ApplicantFacts`] from stored relations and birth dates.
pub struct FactDeriver<S> {
    store: Arc<S>,
}

impl<S> FactDeriver<S>
where
    S: ApplicantRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Married when at least one outgoing spouse edge exists, single otherwise.
    pub fn marital_status(&self, id: &ApplicantId) -> Result<MaritalStatus, EligibilityError> {
        let spouses = self.store.relations_from(id, Some(RelationKind::Spouse))?;
        Ok(if spouses.is_empty() {
            MaritalStatus::Single
        } else {
            MaritalStatus::Married
        })
    }

    /// Education levels of every child reachable through an outgoing child edge.
    ///
    /// Any child with an unusable birth date aborts the whole derivation. Edges whose
    /// target applicant has been deleted are skipped.
    pub fn children_levels(
        &self,
        id: &ApplicantId,
        as_of: NaiveDate,
    ) -> Result<BTreeSet<EducationLevel>, EligibilityError> {
        let mut levels = BTreeSet::new();

        for edge in self.store.relations_from(id, Some(RelationKind::Child))? {
            let Some(child) = self.store.applicant(&edge.id2)? else {
                warn!(parent = %id, child = %edge.id2, "child relation points at a missing applicant");
                continue;
            };

            let age = parse_birth_date(&child.date_of_birth)
                .and_then(|born| age_on(born, as_of))
                .map_err(|source| EligibilityError::MalformedDate {
                    child: child.id,
                    source,
                })?;
            levels.insert(EducationLevel::for_age(age));
        }

        Ok(levels)
    }

    pub fn derive(
        &self,
        applicant: &Applicant,
        as_of: NaiveDate,
    ) -> Result<ApplicantFacts, EligibilityError> {
        Ok(ApplicantFacts {
            marital_status: self.marital_status(&applicant.id)?,
            employment_status: applicant.employment_status,
            children_education_levels: self.children_levels(&applicant.id, as_of)?,
        })
    }
}
