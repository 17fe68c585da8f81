//! Subscriber installation.

use relay_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::types::LogLevel;

/// Crates whose noise is capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "tower_http"];

/// Failure to install the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter directive string for a configured level.
///
/// The base level applies to every target; chatty HTTP internals are
/// capped at `warn` unless the base level is already stricter.
pub fn build_filter(level: &str) -> String {
    let level = LogLevel::from_str_lossy(level);
    let mut directives = level.to_string();
    let quiet = level.max(LogLevel::Warn);
    for module in QUIET_MODULES {
        directives.push_str(&format!(",{module}={quiet}"));
    }
    directives
}

/// Install the global subscriber. Call once at startup.
///
/// `RUST_LOG`, when set, replaces the configured level entirely.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter(&settings.level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()?;
    }

    tracing::debug!(level = %settings.level, json = settings.json, "logging initialized");
    Ok(())
}
