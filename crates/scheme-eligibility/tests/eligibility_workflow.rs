//! End-to-end eligibility scenarios over the seeded SQLite store, using only the public
//! service facades.

use std::sync::Arc;

use chrono::NaiveDate;

use scheme_eligibility::eligibility::{EligibilityError, EligibilityService};
use scheme_eligibility::records::seed::{GWEN, JAMES, MARY, RETRENCHMENT, RETRENCHMENT_FAMILIES};
use scheme_eligibility::records::{
    seed_if_empty, ApplicantDraft, ApplicantPatch, CriteriaDraft, EmploymentStatus,
    MaritalStatus, Relation, RelationKind, RecordsService, SchemeDraft, SchemeId,
    SchemesRequest, Sex, SqliteStore,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn seeded() -> (RecordsService<SqliteStore>, EligibilityService<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().expect("sqlite opens"));
    assert!(seed_if_empty(store.as_ref()).expect("seeded"));
    (
        RecordsService::new(store.clone()),
        EligibilityService::new(store),
    )
}

fn eligible_ids(
    eligibility: &EligibilityService<SqliteStore>,
    applicant: &scheme_eligibility::records::ApplicantId,
    as_of: NaiveDate,
) -> Vec<SchemeId> {
    eligibility
        .eligible_schemes(applicant, as_of)
        .expect("evaluated")
        .into_iter()
        .map(|scheme| scheme.id)
        .collect()
}

#[test]
fn seeding_is_skipped_once_populated() {
    let store = SqliteStore::in_memory().expect("sqlite opens");
    assert!(seed_if_empty(&store).expect("first seed"));
    assert!(!seed_if_empty(&store).expect("second seed"));
}

#[test]
fn mary_qualifies_for_both_demo_schemes() {
    let (_, eligibility) = seeded();
    assert_eq!(
        eligible_ids(&eligibility, &MARY, date(2026, 10, 18)),
        [RETRENCHMENT, RETRENCHMENT_FAMILIES]
    );
}

#[test]
fn earlier_evaluation_date_drops_family_scheme() {
    let (_, eligibility) = seeded();

    // Gwen is six and Jayden four at the start of 2023, so no child is in primary school yet.
    assert_eq!(
        eligible_ids(&eligibility, &MARY, date(2023, 1, 1)),
        [RETRENCHMENT]
    );
}

#[test]
fn finding_work_removes_retrenchment_support() {
    let (records, eligibility) = seeded();
    records
        .update_applicant(
            &MARY,
            ApplicantPatch {
                employment_status: Some(EmploymentStatus::Employed),
                ..ApplicantPatch::default()
            },
        )
        .expect("updated");

    assert!(eligible_ids(&eligibility, &MARY, date(2026, 10, 18)).is_empty());
}

#[test]
fn marriage_unlocks_married_scheme() {
    let (records, eligibility) = seeded();
    let created = records
        .create_schemes(SchemesRequest {
            schemes: vec![SchemeDraft {
                id: None,
                name: "Young Couples Grant".to_string(),
                criteria: vec![CriteriaDraft {
                    marital_status: Some(MaritalStatus::Married),
                    ..CriteriaDraft::default()
                }],
                benefits: Vec::new(),
            }],
        })
        .expect("scheme created");
    let couples = created[0].id;

    let as_of = date(2026, 10, 18);
    assert!(!eligible_ids(&eligibility, &JAMES, as_of).contains(&couples));

    let partner = records
        .create_applicant(ApplicantDraft {
            name: "Priya".to_string(),
            employment_status: EmploymentStatus::Employed,
            sex: Sex::Female,
            date_of_birth: "1991-05-20".to_string(),
        })
        .expect("applicant created");
    records
        .add_relation(Relation {
            id1: JAMES,
            id2: partner.id,
            relation: RelationKind::Spouse,
        })
        .expect("relation added");

    assert_eq!(
        eligible_ids(&eligibility, &JAMES, as_of),
        [RETRENCHMENT, couples]
    );
}

#[test]
fn corrupted_child_birth_date_fails_evaluation() {
    let (records, eligibility) = seeded();
    records
        .update_applicant(
            &GWEN,
            ApplicantPatch {
                date_of_birth: Some("2030-01-01".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .expect("future dates still parse");

    let err = eligibility
        .eligible_schemes(&MARY, date(2026, 10, 18))
        .expect_err("evaluation aborted");
    assert!(matches!(err, EligibilityError::MalformedDate { child, .. } if child == GWEN));
}

#[test]
fn removed_scheme_disappears_from_results() {
    let (records, eligibility) = seeded();
    records.delete_scheme(&RETRENCHMENT).expect("deleted");

    assert_eq!(
        eligible_ids(&eligibility, &MARY, date(2026, 10, 18)),
        [RETRENCHMENT_FAMILIES]
    );
}
