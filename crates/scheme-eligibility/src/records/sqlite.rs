use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::domain::{
    Applicant, ApplicantId, ApplicantPatch, Application, ApplicationId, ApplicationPatch,
    Benefit, BenefitId, Criteria, CriteriaId, EducationLevel, Relation, RelationKind, Scheme,
    SchemeId, SchemePatch, StoredTag,
};
use super::repository::{
    ApplicantRepository, ApplicationRepository, SchemeRepository, StoreError,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS applicants (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        employment_status TEXT NOT NULL,
        sex TEXT NOT NULL,
        date_of_birth TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS relations (
        id1 TEXT NOT NULL,
        id2 TEXT NOT NULL,
        relation TEXT NOT NULL,
        PRIMARY KEY (id1, id2)
    );
    CREATE TABLE IF NOT EXISTS schemes (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS criteria (
        id TEXT PRIMARY KEY,
        marital_status TEXT CHECK (marital_status IN ('single', 'married', 'widowed', 'divorced') OR marital_status IS NULL),
        employment_status TEXT CHECK (employment_status IN ('employed', 'unemployed') OR employment_status IS NULL),
        education_levels TEXT
    );
    CREATE TABLE IF NOT EXISTS benefits (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        amount REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS scheme_criteria (
        scheme_id TEXT NOT NULL REFERENCES schemes(id),
        criteria_id TEXT NOT NULL REFERENCES criteria(id),
        PRIMARY KEY (scheme_id, criteria_id)
    );
    CREATE TABLE IF NOT EXISTS scheme_benefits (
        scheme_id TEXT NOT NULL REFERENCES schemes(id),
        benefit_id TEXT NOT NULL REFERENCES benefits(id),
        PRIMARY KEY (scheme_id, benefit_id)
    );
    CREATE TABLE IF NOT EXISTS applications (
        id TEXT PRIMARY KEY,
        applicant_id TEXT NOT NULL,
        scheme_id TEXT NOT NULL,
        status TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_relations_kind ON relations(id1, relation);
";

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Unavailable(value.to_string()),
        }
    }
}

/// Relational store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened sqlite record store");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".to_string()))
    }

    /// Runs raw SQL against the connection. Used by tests to plant rows the typed API refuses.
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }
}

fn decode_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|err| StoreError::Corrupt(format!("invalid id '{raw}': {err}")))
}

fn decode_tag<T: StoredTag>(raw: &str) -> Result<T, StoreError> {
    T::from_tag(raw).ok_or_else(|| StoreError::Corrupt(format!("unknown {} '{raw}'", T::KIND)))
}

fn decode_optional_tag<T: StoredTag>(raw: Option<String>) -> Result<Option<T>, StoreError> {
    raw.as_deref().map(decode_tag).transpose()
}

fn decode_levels(raw: Option<String>) -> Result<Option<BTreeSet<EducationLevel>>, StoreError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let tags: Vec<String> = serde_json::from_str(&raw)
        .map_err(|err| StoreError::Corrupt(format!("invalid education levels '{raw}': {err}")))?;
    tags.iter()
        .map(|tag| decode_tag(tag))
        .collect::<Result<BTreeSet<_>, _>>()
        .map(Some)
}

fn encode_levels(levels: &Option<BTreeSet<EducationLevel>>) -> Result<Option<String>, StoreError> {
    levels
        .as_ref()
        .map(|levels| {
            let tags: Vec<&str> = levels.iter().map(|level| level.tag()).collect();
            serde_json::to_string(&tags)
                .map_err(|err| StoreError::Unavailable(format!("encode education levels: {err}")))
        })
        .transpose()
}

struct ApplicantRow {
    id: String,
    name: String,
    employment_status: String,
    sex: String,
    date_of_birth: String,
}

impl ApplicantRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            employment_status: row.get(2)?,
            sex: row.get(3)?,
            date_of_birth: row.get(4)?,
        })
    }

    fn decode(self) -> Result<Applicant, StoreError> {
        Ok(Applicant {
            id: ApplicantId(decode_uuid(&self.id)?),
            name: self.name,
            employment_status: decode_tag(&self.employment_status)?,
            sex: decode_tag(&self.sex)?,
            date_of_birth: self.date_of_birth,
        })
    }
}

struct ApplicationRow {
    id: String,
    applicant_id: String,
    scheme_id: String,
    status: String,
}

impl ApplicationRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            applicant_id: row.get(1)?,
            scheme_id: row.get(2)?,
            status: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Application, StoreError> {
        Ok(Application {
            id: ApplicationId(decode_uuid(&self.id)?),
            applicant_id: ApplicantId(decode_uuid(&self.applicant_id)?),
            scheme_id: SchemeId(decode_uuid(&self.scheme_id)?),
            status: decode_tag(&self.status)?,
        })
    }
}

fn select_applicant(conn: &Connection, id: &ApplicantId) -> Result<Option<Applicant>, StoreError> {
    conn.query_row(
        "SELECT id, name, employment_status, sex, date_of_birth FROM applicants WHERE id = ?1",
        [id.to_string()],
        ApplicantRow::from_row,
    )
    .optional()?
    .map(ApplicantRow::decode)
    .transpose()
}

fn exists(conn: &Connection, sql: &str, id: String) -> Result<bool, StoreError> {
    let found = conn
        .query_row(sql, [id], |row| row.get::<_, i64>(0))
        .optional()?;
    Ok(found.is_some())
}

fn check_references(conn: &Connection, application: &Application) -> Result<(), StoreError> {
    if !exists(
        conn,
        "SELECT 1 FROM applicants WHERE id = ?1",
        application.applicant_id.to_string(),
    )? {
        return Err(StoreError::MissingReference("applicant"));
    }
    if !exists(
        conn,
        "SELECT 1 FROM schemes WHERE id = ?1",
        application.scheme_id.to_string(),
    )? {
        return Err(StoreError::MissingReference("scheme"));
    }
    Ok(())
}

fn load_scheme(conn: &Connection, id: String, name: String) -> Result<Scheme, StoreError> {
    let mut criteria_stmt = conn.prepare(
        "SELECT c.id, c.marital_status, c.employment_status, c.education_levels
         FROM scheme_criteria sc
         JOIN criteria c ON c.id = sc.criteria_id
         WHERE sc.scheme_id = ?1
         ORDER BY c.rowid",
    )?;
    let criteria_rows = criteria_stmt
        .query_map([&id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let criteria = criteria_rows
        .into_iter()
        .map(|(criteria_id, marital, employment, levels)| {
            Ok(Criteria {
                id: CriteriaId(decode_uuid(&criteria_id)?),
                marital_status: decode_optional_tag(marital)?,
                employment_status: decode_optional_tag(employment)?,
                education_levels: decode_levels(levels)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let mut benefit_stmt = conn.prepare(
        "SELECT b.id, b.name, b.amount
         FROM scheme_benefits sb
         JOIN benefits b ON b.id = sb.benefit_id
         WHERE sb.scheme_id = ?1
         ORDER BY b.rowid",
    )?;
    let benefit_rows = benefit_stmt
        .query_map([&id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let benefits = benefit_rows
        .into_iter()
        .map(|(benefit_id, benefit_name, amount)| {
            Ok(Benefit {
                id: BenefitId(decode_uuid(&benefit_id)?),
                name: benefit_name,
                amount,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(Scheme {
        id: SchemeId(decode_uuid(&id)?),
        name,
        criteria,
        benefits,
    })
}

fn select_scheme(conn: &Connection, id: &SchemeId) -> Result<Option<Scheme>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name FROM schemes WHERE id = ?1",
            [id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    row.map(|(id, name)| load_scheme(conn, id, name)).transpose()
}

fn write_scheme(tx: &Transaction<'_>, scheme: &Scheme) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO schemes (id, name) VALUES (?1, ?2)",
        params![scheme.id.to_string(), scheme.name],
    )?;

    for criteria in &scheme.criteria {
        tx.execute(
            "INSERT INTO criteria (id, marital_status, employment_status, education_levels)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                criteria.id.to_string(),
                criteria.marital_status.map(|status| status.tag()),
                criteria.employment_status.map(|status| status.tag()),
                encode_levels(&criteria.education_levels)?,
            ],
        )?;
        tx.execute(
            "INSERT INTO scheme_criteria (scheme_id, criteria_id) VALUES (?1, ?2)",
            params![scheme.id.to_string(), criteria.id.to_string()],
        )?;
    }

    for benefit in &scheme.benefits {
        tx.execute(
            "INSERT INTO benefits (id, name, amount) VALUES (?1, ?2, ?3)",
            params![benefit.id.to_string(), benefit.name, benefit.amount],
        )?;
        tx.execute(
            "INSERT INTO scheme_benefits (scheme_id, benefit_id) VALUES (?1, ?2)",
            params![scheme.id.to_string(), benefit.id.to_string()],
        )?;
    }

    Ok(())
}

impl ApplicantRepository for SqliteStore {
    fn applicants(&self) -> Result<Vec<Applicant>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, employment_status, sex, date_of_birth FROM applicants ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], ApplicantRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ApplicantRow::decode).collect()
    }

    fn applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, StoreError> {
        let conn = self.lock()?;
        select_applicant(&conn, id)
    }

    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO applicants (id, name, employment_status, sex, date_of_birth)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                applicant.id.to_string(),
                applicant.name,
                applicant.employment_status.tag(),
                applicant.sex.tag(),
                applicant.date_of_birth,
            ],
        )?;
        Ok(applicant)
    }

    fn update_applicant(
        &self,
        id: &ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, StoreError> {
        let conn = self.lock()?;
        let mut applicant = select_applicant(&conn, id)?.ok_or(StoreError::NotFound)?;
        patch.apply(&mut applicant);
        conn.execute(
            "UPDATE applicants
             SET name = ?1, employment_status = ?2, sex = ?3, date_of_birth = ?4
             WHERE id = ?5",
            params![
                applicant.name,
                applicant.employment_status.tag(),
                applicant.sex.tag(),
                applicant.date_of_birth,
                id.to_string(),
            ],
        )?;
        Ok(applicant)
    }

    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM applicants WHERE id = ?1", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn relations_from(
        &self,
        id: &ApplicantId,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id1, id2, relation FROM relations
             WHERE id1 = ?1 AND (?2 IS NULL OR relation = ?2)
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![id.to_string(), kind.map(|kind| kind.tag())], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id1, id2, relation)| {
                Ok(Relation {
                    id1: ApplicantId(decode_uuid(&id1)?),
                    id2: ApplicantId(decode_uuid(&id2)?),
                    relation: decode_tag(&relation)?,
                })
            })
            .collect()
    }

    fn insert_relation(&self, relation: Relation) -> Result<Relation, StoreError> {
        let conn = self.lock()?;
        for id in [relation.id1, relation.id2] {
            if !exists(&conn, "SELECT 1 FROM applicants WHERE id = ?1", id.to_string())? {
                return Err(StoreError::MissingReference("applicant"));
            }
        }
        conn.execute(
            "INSERT INTO relations (id1, id2, relation) VALUES (?1, ?2, ?3)",
            params![
                relation.id1.to_string(),
                relation.id2.to_string(),
                relation.relation.tag(),
            ],
        )?;
        Ok(relation)
    }
}

impl SchemeRepository for SqliteStore {
    fn catalog(&self) -> Result<Vec<Scheme>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM schemes ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, name)| load_scheme(&conn, id, name))
            .collect()
    }

    fn scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, StoreError> {
        let conn = self.lock()?;
        select_scheme(&conn, id)
    }

    fn insert_schemes(&self, schemes: Vec<Scheme>) -> Result<Vec<Scheme>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for scheme in &schemes {
            write_scheme(&tx, scheme)?;
        }
        tx.commit()?;
        Ok(schemes)
    }

    fn update_scheme(&self, id: &SchemeId, patch: SchemePatch) -> Result<Scheme, StoreError> {
        let conn = self.lock()?;
        let mut scheme = select_scheme(&conn, id)?.ok_or(StoreError::NotFound)?;
        patch.apply(&mut scheme);
        conn.execute(
            "UPDATE schemes SET name = ?1 WHERE id = ?2",
            params![scheme.name, id.to_string()],
        )?;
        Ok(scheme)
    }

    fn delete_scheme(&self, id: &SchemeId) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM scheme_criteria WHERE scheme_id = ?1",
            [id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM scheme_benefits WHERE scheme_id = ?1",
            [id.to_string()],
        )?;
        let removed = tx.execute("DELETE FROM schemes WHERE id = ?1", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }
}

impl ApplicationRepository for SqliteStore {
    fn applications(&self) -> Result<Vec<Application>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, applicant_id, scheme_id, status FROM applications ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], ApplicationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ApplicationRow::decode).collect()
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let conn = self.lock()?;
        check_references(&conn, &application)?;
        conn.execute(
            "INSERT INTO applications (id, applicant_id, scheme_id, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                application.id.to_string(),
                application.applicant_id.to_string(),
                application.scheme_id.to_string(),
                application.status.tag(),
            ],
        )?;
        Ok(application)
    }

    fn update_application(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, StoreError> {
        let conn = self.lock()?;
        let mut application = conn
            .query_row(
                "SELECT id, applicant_id, scheme_id, status FROM applications WHERE id = ?1",
                [id.to_string()],
                ApplicationRow::from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)?
            .decode()?;

        patch.apply(&mut application);
        check_references(&conn, &application)?;
        conn.execute(
            "UPDATE applications SET applicant_id = ?1, scheme_id = ?2, status = ?3 WHERE id = ?4",
            params![
                application.applicant_id.to_string(),
                application.scheme_id.to_string(),
                application.status.tag(),
                id.to_string(),
            ],
        )?;
        Ok(application)
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM applications WHERE id = ?1", [id.to_string()])?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
