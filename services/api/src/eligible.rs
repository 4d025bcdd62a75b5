use chrono::{Local, NaiveDate};
use clap::Args;
use scheme_eligibility::config::AppConfig;
use scheme_eligibility::eligibility::router::EligibleSchemeView;
use scheme_eligibility::eligibility::EligibilityService;
use scheme_eligibility::error::AppError;
use scheme_eligibility::records::{
    seed_if_empty, ApplicantId, ApplicantRepository, InMemoryStore, SchemeRepository,
    SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EligibleArgs {
    /// Applicant ID to evaluate
    #[arg(long)]
    pub(crate) applicant: ApplicantId,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// SQLite database to read. Defaults to APP_DATABASE_PATH, then the demo records.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) fn run_eligible(args: EligibleArgs) -> Result<(), AppError> {
    let EligibleArgs {
        applicant,
        as_of,
        database,
    } = args;

    let config = AppConfig::load()?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let schemes = match database.or(config.storage.database_path) {
        Some(path) => evaluate(Arc::new(SqliteStore::open(path)?), &applicant, as_of)?,
        None => {
            let store = Arc::new(InMemoryStore::default());
            if config.storage.seed_data {
                seed_if_empty(store.as_ref())?;
            }
            evaluate(store, &applicant, as_of)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&schemes)?);
    Ok(())
}

fn evaluate<S>(
    store: Arc<S>,
    applicant: &ApplicantId,
    as_of: NaiveDate,
) -> Result<Vec<EligibleSchemeView>, AppError>
where
    S: ApplicantRepository + SchemeRepository + 'static,
{
    let service = EligibilityService::new(store);
    let schemes = service.eligible_schemes(applicant, as_of)?;
    Ok(schemes.into_iter().map(EligibleSchemeView::from).collect())
}
