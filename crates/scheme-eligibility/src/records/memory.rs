use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Applicant, ApplicantId, ApplicantPatch, Application, ApplicationId, ApplicationPatch,
    Relation, RelationKind, Scheme, SchemeId, SchemePatch,
};
use super::repository::{
    ApplicantRepository, ApplicationRepository, SchemeRepository, StoreError,
};

#[derive(Debug, Default)]
struct Tables {
    applicants: Vec<Applicant>,
    relations: Vec<Relation>,
    schemes: Vec<Scheme>,
    applications: Vec<Application>,
}

impl Tables {
    fn has_applicant(&self, id: &ApplicantId) -> bool {
        self.applicants.iter().any(|applicant| &applicant.id == id)
    }

    fn has_scheme(&self, id: &SchemeId) -> bool {
        self.schemes.iter().any(|scheme| &scheme.id == id)
    }

    fn check_references(&self, application: &Application) -> Result<(), StoreError> {
        if !self.has_applicant(&application.applicant_id) {
            return Err(StoreError::MissingReference("applicant"));
        }
        if !self.has_scheme(&application.scheme_id) {
            return Err(StoreError::MissingReference("scheme"));
        }
        Ok(())
    }
}

/// Process-local store. Tables keep insertion order so the catalog order is stable.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store mutex poisoned".to_string()))
    }
}

impl ApplicantRepository for InMemoryStore {
    fn applicants(&self) -> Result<Vec<Applicant>, StoreError> {
        Ok(self.lock()?.applicants.clone())
    }

    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .applicants
            .iter()
            .find(|applicant| &applicant.id == id)
            .cloned())
    }

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, StoreError> {
        let mut guard = self.lock()?;
        if guard.has_applicant(&applicant.id) {
            return Err(StoreError::Conflict);
        }
        guard.applicants.push(applicant.clone());
        Ok(applicant)
    }

    fn update_applicant(
        &self,
        id: &ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, StoreError> {
        let mut guard = self.lock()?;
        let applicant = guard
            .applicants
            .iter_mut()
            .find(|applicant| &applicant.id == id)
            .ok_or(StoreError::NotFound)?;
        patch.apply(applicant);
        Ok(applicant.clone())
    }

    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let before = guard.applicants.len();
        guard.applicants.retain(|applicant| &applicant.id != id);
        if guard.applicants.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn relations_from(
        &self,
        id: &ApplicantId,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .relations
            .iter()
            .filter(|relation| &relation.id1 == id)
            .filter(|relation| kind.map_or(true, |kind| relation.relation == kind))
            .copied()
            .collect())
    }

    fn insert_relation(&self, relation: Relation) -> Result<Relation, StoreError> {
        let mut guard = self.lock()?;
        if !guard.has_applicant(&relation.id1) || !guard.has_applicant(&relation.id2) {
            return Err(StoreError::MissingReference("applicant"));
        }
        if guard
            .relations
            .iter()
            .any(|existing| existing.id1 == relation.id1 && existing.id2 == relation.id2)
        {
            return Err(StoreError::Conflict);
        }
        guard.relations.push(relation);
        Ok(relation)
    }
}

impl SchemeRepository for InMemoryStore {
    fn catalog(&self) -> Result<Vec<Scheme>, StoreError> {
        Ok(self.lock()?.schemes.clone())
    }

    fn scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.schemes.iter().find(|scheme| &scheme.id == id).cloned())
    }

    fn insert_schemes(&self, schemes: Vec<Scheme>) -> Result<Vec<Scheme>, StoreError> {
        let mut guard = self.lock()?;

        let mut scheme_ids: HashSet<SchemeId> =
            guard.schemes.iter().map(|scheme| scheme.id).collect();
        let mut benefit_ids: HashSet<_> = guard
            .schemes
            .iter()
            .flat_map(|scheme| scheme.benefits.iter().map(|benefit| benefit.id))
            .collect();
        for scheme in &schemes {
            if !scheme_ids.insert(scheme.id) {
                return Err(StoreError::Conflict);
            }
            for benefit in &scheme.benefits {
                if !benefit_ids.insert(benefit.id) {
                    return Err(StoreError::Conflict);
                }
            }
        }

        guard.schemes.extend(schemes.iter().cloned());
        Ok(schemes)
    }

    fn update_scheme(&self, id: &SchemeId, patch: SchemePatch) -> Result<Scheme, StoreError> {
        let mut guard = self.lock()?;
        let scheme = guard
            .schemes
            .iter_mut()
            .find(|scheme| &scheme.id == id)
            .ok_or(StoreError::NotFound)?;
        patch.apply(scheme);
        Ok(scheme.clone())
    }

    fn delete_scheme(&self, id: &SchemeId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let before = guard.schemes.len();
        guard.schemes.retain(|scheme| &scheme.id != id);
        if guard.schemes.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

impl ApplicationRepository for InMemoryStore {
    fn applications(&self) -> Result<Vec<Application>, StoreError> {
        Ok(self.lock()?.applications.clone())
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut guard = self.lock()?;
        if guard
            .applications
            .iter()
            .any(|existing| existing.id == application.id)
        {
            return Err(StoreError::Conflict);
        }
        guard.check_references(&application)?;
        guard.applications.push(application);
        Ok(application)
    }

    fn update_application(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, StoreError> {
        let mut guard = self.lock()?;
        let position = guard
            .applications
            .iter()
            .position(|application| &application.id == id)
            .ok_or(StoreError::NotFound)?;

        let mut updated = guard.applications[position];
        patch.apply(&mut updated);
        guard.check_references(&updated)?;
        guard.applications[position] = updated;
        Ok(updated)
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let before = guard.applications.len();
        guard.applications.retain(|application| &application.id != id);
        if guard.applications.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
