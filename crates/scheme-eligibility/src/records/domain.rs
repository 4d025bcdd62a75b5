use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim()).map(Self)
            }
        }
    };
}

record_id!(
    /// Identifier wrapper for applicants.
    ApplicantId
);
record_id!(
    /// Identifier wrapper for assistance schemes.
    SchemeId
);
record_id!(
    /// Identifier wrapper for criteria rows attached to schemes.
    CriteriaId
);
record_id!(
    /// Identifier wrapper for scheme benefits.
    BenefitId
);
record_id!(
    /// Identifier wrapper for applications.
    ApplicationId
);

/// Lowercase tag vocabulary shared by every stored enum.
pub trait StoredTag: Sized + Copy + 'static {
    const ALL: &'static [Self];
    const KIND: &'static str;

    fn tag(self) -> &'static str;

    fn from_tag(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|value| value.tag() == raw)
    }
}

macro_rules! stored_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl StoredTag for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const KIND: &'static str = $kind;

            fn tag(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.tag())
            }
        }
    };
}

stored_enum!(
    /// Employment status recorded on the applicant and optionally required by criteria.
    EmploymentStatus, "employment status" {
        Employed => "employed",
        Unemployed => "unemployed",
    }
);

stored_enum!(
    Sex, "sex" {
        Male => "male",
        Female => "female",
    }
);

stored_enum!(
    /// Marital status vocabulary accepted on criteria. Derivation only ever yields
    /// `Single` or `Married`.
    MaritalStatus, "marital status" {
        Single => "single",
        Married => "married",
        Widowed => "widowed",
        Divorced => "divorced",
    }
);

stored_enum!(
    /// Directed kinship from `id1` to `id2`.
    RelationKind, "relation" {
        Spouse => "spouse",
        Child => "child",
        Parent => "parent",
        Sibling => "sibling",
    }
);

stored_enum!(
    /// Schooling band derived from a child's age in completed years.
    EducationLevel, "education level" {
        Kindergarten => "kindergarten",
        Primary => "primary",
        Secondary => "secondary",
        Tertiary => "tertiary",
        Higher => "higher",
    }
);

stored_enum!(
    ApplicationStatus, "application status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

impl EducationLevel {
    /// Bands are closed on their upper bound: 6 is kindergarten, 7 is primary.
    pub fn for_age(age: u32) -> Self {
        match age {
            0..=6 => Self::Kindergarten,
            7..=12 => Self::Primary,
            13..=16 => Self::Secondary,
            17..=18 => Self::Tertiary,
            _ => Self::Higher,
        }
    }
}

/// Stored applicant. The birth date is kept as the text the store holds; the fact
/// deriver parses it when eligibility is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: String,
}

/// Intake payload for a new applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDraft {
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: String,
}

/// Fields to change on an applicant; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

impl ApplicantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.employment_status.is_none()
            && self.sex.is_none()
            && self.date_of_birth.is_none()
    }

    pub fn apply(self, applicant: &mut Applicant) {
        if let Some(name) = self.name {
            applicant.name = name;
        }
        if let Some(status) = self.employment_status {
            applicant.employment_status = status;
        }
        if let Some(sex) = self.sex {
            applicant.sex = sex;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            applicant.date_of_birth = date_of_birth;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id1: ApplicantId,
    pub id2: ApplicantId,
    pub relation: RelationKind,
}

/// Optional constraints on a scheme. `None` means "no constraint" for that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub id: CriteriaId,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default)]
    pub education_levels: Option<BTreeSet<EducationLevel>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: BenefitId,
    pub name: String,
    pub amount: f64,
}

/// Scheme together with every criteria row and benefit linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: SchemeId,
    pub name: String,
    pub criteria: Vec<Criteria>,
    pub benefits: Vec<Benefit>,
}

/// Criteria content for a new scheme. A fresh criteria row is always created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaDraft {
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default)]
    pub education_levels: Option<BTreeSet<EducationLevel>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitDraft {
    #[serde(default)]
    pub id: Option<BenefitId>,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDraft {
    #[serde(default)]
    pub id: Option<SchemeId>,
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<CriteriaDraft>,
    #[serde(default)]
    pub benefits: Vec<BenefitDraft>,
}

/// Batch scheme creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemesRequest {
    pub schemes: Vec<SchemeDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemePatch {
    #[serde(default)]
    pub name: Option<String>,
}

impl SchemePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    pub fn apply(self, scheme: &mut Scheme) {
        if let Some(name) = self.name {
            scheme.name = name;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: ApplicantId,
    pub scheme_id: SchemeId,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub applicant_id: ApplicantId,
    pub scheme_id: SchemeId,
    #[serde(default = "pending")]
    pub status: ApplicationStatus,
}

fn pending() -> ApplicationStatus {
    ApplicationStatus::Pending
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default)]
    pub applicant_id: Option<ApplicantId>,
    #[serde(default)]
    pub scheme_id: Option<SchemeId>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        self.applicant_id.is_none() && self.scheme_id.is_none() && self.status.is_none()
    }

    pub fn apply(self, application: &mut Application) {
        if let Some(applicant_id) = self.applicant_id {
            application.applicant_id = applicant_id;
        }
        if let Some(scheme_id) = self.scheme_id {
            application.scheme_id = scheme_id;
        }
        if let Some(status) = self.status {
            application.status = status;
        }
    }
}
