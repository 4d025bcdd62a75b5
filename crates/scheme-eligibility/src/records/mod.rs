//! Applicants, relations, schemes and applications, plus the stores that hold them.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;
pub mod sqlite;

pub use domain::{
    Applicant, ApplicantDraft, ApplicantId, ApplicantPatch, Application, ApplicationDraft,
    ApplicationId, ApplicationPatch, ApplicationStatus, Benefit, BenefitDraft, BenefitId,
    Criteria, CriteriaDraft, CriteriaId, EducationLevel, EmploymentStatus, MaritalStatus,
    Relation, RelationKind, Scheme, SchemeDraft, SchemeId, SchemePatch, SchemesRequest, Sex,
    StoredTag,
};
pub use memory::InMemoryStore;
pub use repository::{
    ApplicantRepository, ApplicationRepository, RecordStore, SchemeRepository, StoreError,
};
pub use router::records_router;
pub use seed::{demo_records, seed_if_empty, SeedData};
pub use service::{RecordsError, RecordsService};
pub use sqlite::SqliteStore;
