use super::facts::ApplicantFacts;
use crate::records::domain::{Criteria, Scheme};

/// A criterion holds when each of its present fields matches the facts. A required
/// education-level set needs at least one child at one of the listed levels.
pub fn criterion_satisfied(criteria: &Criteria, facts: &ApplicantFacts) -> bool {
    let marital = criteria
        .marital_status
        .map_or(true, |status| status == facts.marital_status);
    let employment = criteria
        .employment_status
        .map_or(true, |status| status == facts.employment_status);
    let education = criteria.education_levels.as_ref().map_or(true, |levels| {
        !levels.is_disjoint(&facts.children_education_levels)
    });

    marital && employment && education
}

/// Every attached criterion must hold. A scheme without criteria is open to everyone.
pub fn scheme_eligible(scheme: &Scheme, facts: &ApplicantFacts) -> bool {
    scheme
        .criteria
        .iter()
        .all(|criteria| criterion_satisfied(criteria, facts))
}

/// Eligible schemes in catalog order. No ranking is applied.
pub fn find_eligible_schemes<'a>(facts: &ApplicantFacts, catalog: &'a [Scheme]) -> Vec<&'a Scheme> {
    catalog
        .iter()
        .filter(|scheme| scheme_eligible(scheme, facts))
        .collect()
}
