use std::sync::Arc;

use super::common::*;
use crate::eligibility::{EligibilityError, EligibilityService};
use crate::records::domain::{
    ApplicantId, EducationLevel, EmploymentStatus, MaritalStatus,
};
use crate::records::memory::InMemoryStore;
use crate::records::repository::StoreError;

#[test]
fn unknown_applicant_is_reported() {
    let store = Arc::new(InMemoryStore::default());
    let missing = ApplicantId::generate();

    let err = service(store)
        .eligible_schemes(&missing, as_of())
        .expect_err("no such applicant");

    assert!(matches!(err, EligibilityError::ApplicantNotFound(id) if id == missing));
}

#[test]
fn unemployed_parent_of_kindergartener_gets_retrenchment_only() {
    let (store, parent) = household(EmploymentStatus::Unemployed, false, &[born_aged(6)]);
    with_catalog(
        &store,
        vec![
            scheme(
                "Retrenchment Assistance Scheme",
                vec![criteria(None, Some(EmploymentStatus::Unemployed), None)],
            ),
            scheme(
                "Retrenchment Assistance Scheme (families)",
                vec![
                    criteria(None, Some(EmploymentStatus::Unemployed), None),
                    criteria(None, None, Some(&[EducationLevel::Primary])),
                ],
            ),
        ],
    );

    let eligible = service(store)
        .eligible_schemes(&parent, as_of())
        .expect("evaluated");

    let names: Vec<_> = eligible.iter().map(|scheme| scheme.name.as_str()).collect();
    assert_eq!(names, ["Retrenchment Assistance Scheme"]);
}

#[test]
fn child_moving_into_primary_unlocks_family_scheme() {
    let (store, parent) = household(EmploymentStatus::Unemployed, false, &[born_aged(7)]);
    let catalog = with_catalog(
        &store,
        vec![scheme(
            "Families",
            vec![
                criteria(None, Some(EmploymentStatus::Unemployed), None),
                criteria(None, None, Some(&[EducationLevel::Primary])),
            ],
        )],
    );

    let eligible = service(store)
        .eligible_schemes(&parent, as_of())
        .expect("evaluated");

    assert_eq!(eligible, catalog);
}

#[test]
fn empty_catalog_yields_nothing() {
    let (store, parent) = household(EmploymentStatus::Employed, true, &[]);

    let eligible = service(store)
        .eligible_schemes(&parent, as_of())
        .expect("evaluated");

    assert!(eligible.is_empty());
}

#[test]
fn malformed_child_date_fails_whole_evaluation() {
    let (store, parent) = household(
        EmploymentStatus::Unemployed,
        false,
        &["31/02/2019".to_string()],
    );
    with_catalog(&store, vec![scheme("Open", Vec::new())]);

    let err = service(store)
        .eligible_schemes(&parent, as_of())
        .expect_err("evaluation aborted");

    assert!(matches!(err, EligibilityError::MalformedDate { .. }));
}

#[test]
fn facts_reflect_household() {
    let (store, parent) = household(
        EmploymentStatus::Employed,
        true,
        &[born_aged(3), born_aged(18)],
    );

    let derived = service(store).facts(&parent, as_of()).expect("derived");

    assert_eq!(
        derived,
        facts(
            MaritalStatus::Married,
            EmploymentStatus::Employed,
            &[EducationLevel::Kindergarten, EducationLevel::Tertiary]
        )
    );
}

#[test]
fn unavailable_catalog_is_propagated() {
    let (store, parent) = offline_catalog_household();

    let err = EligibilityService::new(store)
        .eligible_schemes(&parent, as_of())
        .expect_err("catalog unreachable");

    assert!(matches!(
        err,
        EligibilityError::Store(StoreError::Unavailable(ref message)) if message == "scheme catalog offline"
    ));
}
