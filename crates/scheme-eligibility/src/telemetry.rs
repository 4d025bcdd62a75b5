use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid APP_LOG_LEVEL '{value}': unable to build EnvFilter")
            }
            TelemetryError::Subscriber(err) => write!(f, "subscriber already installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins over the configured level so operators can raise verbosity per module.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })
        }
    }
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    /// Runs `check` with `RUST_LOG` unset, restoring the previous value afterwards.
    fn without_rust_log(check: impl FnOnce()) {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        let previous = env::var_os("RUST_LOG");
        env::remove_var("RUST_LOG");
        check();
        if let Some(value) = previous {
            env::set_var("RUST_LOG", value);
        }
    }

    #[test]
    fn rejects_unparseable_level() {
        without_rust_log(|| {
            let config = TelemetryConfig {
            log_level: "scheme_eligibility=loud".to_string(),
        };
            let err = env_filter(&config).expect_err("invalid level rejected");
            assert!(err.to_string().contains("scheme_eligibility=loud"));
        });
    }

    #[test]
    fn rust_log_takes_precedence() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        let previous = env::var_os("RUST_LOG");
        env::set_var("RUST_LOG", "warn");

        let config = TelemetryConfig {
            log_level: "scheme_eligibility=loud".to_string(),
        };
        let result = env_filter(&config);

        match previous {
            Some(value) => env::set_var("RUST_LOG", value),
            None => env::remove_var("RUST_LOG"),
        }
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_module_directives() {
        without_rust_log(|| {
            let config = TelemetryConfig {
                log_level: "info,scheme_eligibility=debug".to_string(),
            };
            assert!(env_filter(&config).is_ok());
        });
    }
}
