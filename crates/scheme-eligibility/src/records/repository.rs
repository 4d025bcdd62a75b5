use super::domain::{
    Applicant, ApplicantId, ApplicantPatch, Application, ApplicationId, ApplicationPatch,
    Relation, RelationKind, Scheme, SchemeId, SchemePatch,
};

/// Applicant records and the kinship edges between them.
pub trait ApplicantRepository: Send + Sync {
    fn applicants(&self) -> Result<Vec<Applicant>, StoreError>;
    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, StoreError>;
    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, StoreError>;
    fn update_applicant(
        &self,
        id: &ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, StoreError>;
    /// Removes only the applicant row; relations and applications are left in place.
    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), StoreError>;

    /// Outgoing edges from `id`, optionally restricted to one kind.
    fn relations_from(
        &self,
        id: &ApplicantId,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>, StoreError>;
    fn insert_relation(&self, relation: Relation) -> Result<Relation, StoreError>;
}

/// Scheme catalog including attached criteria and benefits.
pub trait SchemeRepository: Send + Sync {
    /// Every scheme in insertion order. Fails as a whole if any row cannot be decoded.
    fn catalog(&self) -> Result<Vec<Scheme>, StoreError>;
    fn scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, StoreError>;
    fn insert_schemes(&self, schemes: Vec<Scheme>) -> Result<Vec<Scheme>, StoreError>;
    fn update_scheme(&self, id: &SchemeId, patch: SchemePatch) -> Result<Scheme, StoreError>;
    fn delete_scheme(&self, id: &SchemeId) -> Result<(), StoreError>;
}

pub trait ApplicationRepository: Send + Sync {
    fn applications(&self) -> Result<Vec<Application>, StoreError>;
    fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    fn update_application(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, StoreError>;
    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError>;
}

/// Everything the HTTP surface needs from a backing store.
pub trait RecordStore: ApplicantRepository + SchemeRepository + ApplicationRepository {}

impl<T> RecordStore for T where T: ApplicantRepository + SchemeRepository + ApplicationRepository {}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}
