use crate::config::TelemetryConfig;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

/// HTTP stack targets held at `warn` so scrape runs stay readable, unless
/// the configured filter names them itself.
const QUIET_TARGETS: [&str; 3] = ["hyper", "reqwest", "rustls"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("EPHY_LOG_LEVEL '{value}' is not a valid tracing filter: {source}")]
    InvalidFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("log subscriber could not be installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Filter built from the configured level plus the quiet HTTP targets.
pub fn log_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let invalid = |source| TelemetryError::InvalidFilter {
        value: level.to_string(),
        source,
    };

    let mut filter = EnvFilter::try_new(level).map_err(invalid)?;
    for target in QUIET_TARGETS {
        if level.contains(target) {
            continue;
        }
        let directive: Directive = format!("{target}=warn").parse().map_err(invalid)?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Installs the global subscriber on stderr; stdout carries run summaries.
/// `RUST_LOG`, when set and valid, replaces the configured filter entirely.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => log_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
