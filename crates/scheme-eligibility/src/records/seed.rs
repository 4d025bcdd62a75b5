//! Demo records loaded into an empty store at startup.

use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;

use super::domain::{
    Applicant, ApplicantId, Benefit, BenefitId, Criteria, CriteriaId, EducationLevel,
    EmploymentStatus, Relation, RelationKind, Scheme, SchemeId, Sex,
};
use super::repository::{ApplicantRepository, SchemeRepository, StoreError};

pub const JAMES: ApplicantId = ApplicantId(Uuid::from_u128(0x01913b7a_4493_74b2_93f8_e684c4ca935c));
pub const MARY: ApplicantId = ApplicantId(Uuid::from_u128(0x01913b80_2c04_7f9d_86a4_497ef68cb3a0));
pub const GWEN: ApplicantId = ApplicantId(Uuid::from_u128(0x01913b88_1d4d_7152_a7ce_75796a2e8ecf));
pub const JAYDEN: ApplicantId =
    ApplicantId(Uuid::from_u128(0x01913b88_65c6_7255_820f_9c4dd1e5ce79));

pub const RETRENCHMENT: SchemeId = SchemeId(Uuid::from_u128(0x01913b89_9a43_7163_8757_01cc254783f3));
pub const RETRENCHMENT_FAMILIES: SchemeId =
    SchemeId(Uuid::from_u128(0x01913b89_befc_7ae3_bb37_3079aa7f1be0));

const SKILLS_FUTURE_CREDITS: BenefitId =
    BenefitId(Uuid::from_u128(0x01913b8b_9b12_7d2c_a1fa_ea613b802ebc));

/// Records making up the demo data set.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub applicants: Vec<Applicant>,
    pub relations: Vec<Relation>,
    pub schemes: Vec<Scheme>,
}

fn applicant(id: ApplicantId, name: &str, sex: Sex, date_of_birth: &str) -> Applicant {
    Applicant {
        id,
        name: name.to_string(),
        employment_status: EmploymentStatus::Unemployed,
        sex,
        date_of_birth: date_of_birth.to_string(),
    }
}

pub fn demo_records() -> SeedData {
    let applicants = vec![
        applicant(JAMES, "James", Sex::Male, "1990-07-01"),
        applicant(MARY, "Mary", Sex::Female, "1984-10-06"),
        applicant(GWEN, "Gwen", Sex::Female, "2016-02-01"),
        applicant(JAYDEN, "Jayden", Sex::Male, "2018-03-15"),
    ];

    let relations = [GWEN, JAYDEN]
        .into_iter()
        .map(|child| Relation {
            id1: MARY,
            id2: child,
            relation: RelationKind::Child,
        })
        .collect();

    // Criteria rows reuse their scheme's id.
    let schemes = vec![
        Scheme {
            id: RETRENCHMENT,
            name: "Retrenchment Assistance Scheme".to_string(),
            criteria: vec![Criteria {
                id: CriteriaId(RETRENCHMENT.0),
                marital_status: None,
                employment_status: Some(EmploymentStatus::Unemployed),
                education_levels: None,
            }],
            benefits: vec![Benefit {
                id: SKILLS_FUTURE_CREDITS,
                name: "SkillsFuture Credits".to_string(),
                amount: 500.0,
            }],
        },
        Scheme {
            id: RETRENCHMENT_FAMILIES,
            name: "Retrenchment Assistance Scheme (families)".to_string(),
            criteria: vec![Criteria {
                id: CriteriaId(RETRENCHMENT_FAMILIES.0),
                marital_status: None,
                employment_status: Some(EmploymentStatus::Unemployed),
                education_levels: Some(BTreeSet::from([EducationLevel::Primary])),
            }],
            benefits: Vec::new(),
        },
    ];

    SeedData {
        applicants,
        relations,
        schemes,
    }
}

/// Loads [`demo_records`] when the store holds no applicants. Returns whether seeding ran.
pub fn seed_if_empty<S>(store: &S) -> Result<bool, StoreError>
where
    S: ApplicantRepository + SchemeRepository + ?Sized,
{
    if !store.applicants()?.is_empty() {
        info!("store already populated, no seeding done");
        return Ok(false);
    }

    info!("no applicants found, seeding demo records");
    let SeedData {
        applicants,
        relations,
        schemes,
    } = demo_records();

    for applicant in applicants {
        store.insert_applicant(applicant)?;
    }
    for relation in relations {
        store.insert_relation(relation)?;
    }
    store.insert_schemes(schemes)?;

    Ok(true)
}
