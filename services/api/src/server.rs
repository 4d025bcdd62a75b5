use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_record_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use scheme_eligibility::config::AppConfig;
use scheme_eligibility::error::AppError;
use scheme_eligibility::records::{seed_if_empty, InMemoryStore, RecordStore, SqliteStore};
use scheme_eligibility::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    match config.storage.database_path.clone() {
        Some(path) => {
            info!(path = %path.display(), "opening sqlite record store");
            serve(config, Arc::new(SqliteStore::open(path)?)).await
        }
        None => {
            info!("using in-memory record store");
            serve(config, Arc::new(InMemoryStore::default())).await
        }
    }
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: RecordStore + 'static,
{
    if config.storage.seed_data {
        seed_if_empty(store.as_ref())?;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_record_routes(store)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "scheme eligibility service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
