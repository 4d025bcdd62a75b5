//! Scheme eligibility evaluation.
//!
//! Facts about an applicant (marital status, employment status, the education levels of
//! their children) are derived from the record store and matched against every scheme's
//! criteria. A scheme qualifies only when all of its criteria hold.

pub mod facts;
pub mod matcher;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use facts::{age_on, parse_birth_date, ApplicantFacts, BirthDateError, FactDeriver};
pub use matcher::{criterion_satisfied, find_eligible_schemes, scheme_eligible};
pub use router::eligibility_router;
pub use service::EligibilityService;

use crate::records::domain::ApplicantId;
use crate::records::repository::StoreError;

/// Failure while evaluating eligibility. Any error aborts the whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("applicant {0} not found")]
    ApplicantNotFound(ApplicantId),
    #[error("malformed date of birth for child {child}: {source}")]
    MalformedDate {
        child: ApplicantId,
        source: BirthDateError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
