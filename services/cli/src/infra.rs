use ephy_catalog::catalog::{CatalogImporter, DuplicatePolicy, IndexOptions};
use ephy_catalog::config::{AppConfig, CatalogConfig};
use ephy_catalog::error::AppError;
use ephy_catalog::telemetry;
use std::fs;
use std::path::Path;
use tracing::info;

pub(crate) fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) fn parse_duplicate_policy(raw: &str) -> Result<DuplicatePolicy, String> {
    raw.parse()
}

pub(crate) fn catalog_importer(
    config: &CatalogConfig,
    duplicates: Option<DuplicatePolicy>,
) -> CatalogImporter {
    let options = IndexOptions {
        status_rules: config.status_rules.clone(),
        duplicate_policy: duplicates.unwrap_or(config.duplicate_policy),
        ..IndexOptions::default()
    };
    CatalogImporter::new(config.encoding, options)
}

/// Writes a generated file, creating missing parent directories and
/// replacing any previous content.
pub(crate) fn write_output(path: &Path, contents: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    info!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    use ephy_catalog::config::{ScrapeConfig, TelemetryConfig};
    use std::time::Duration;

    AppConfig {
        catalog: CatalogConfig {
            database_version: "2026-01-27".to_string(),
            ..CatalogConfig::default()
        },
        scrape: ScrapeConfig {
            delay: Duration::ZERO,
            checkpoint_every: 0,
            ..ScrapeConfig::default()
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
        },
    }
}
