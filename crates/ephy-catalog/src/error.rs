use crate::catalog::CatalogImportError;
use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::enrichment::{FetchError, ScrapeError};
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Catalog(CatalogImportError),
    Database(DatabaseError),
    Fetch(FetchError),
    Scrape(ScrapeError),
    Output(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Database(err) => write!(f, "database error: {}", err),
            AppError::Fetch(err) => write!(f, "fetch error: {}", err),
            AppError::Scrape(err) => write!(f, "scrape error: {}", err),
            AppError::Output(err) => write!(f, "output encoding error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::Fetch(err) => Some(err),
            AppError::Scrape(err) => Some(err),
            AppError::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CatalogImportError> for AppError {
    fn from(value: CatalogImportError) -> Self {
        Self::Catalog(value)
    }
}

impl From<DatabaseError> for AppError {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<ScrapeError> for AppError {
    fn from(value: ScrapeError) -> Self {
        Self::Scrape(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn wraps_module_errors_with_context() {
        let err = AppError::from(CatalogImportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "produits.csv",
        )));
        assert_eq!(
            err.to_string(),
            "catalog error: failed to read catalog export: produits.csv"
        );
        assert!(err.source().is_some());

        let err = AppError::from(FetchError::Status {
            id: "9900115".to_string(),
            status: 503,
        });
        assert_eq!(
            err.to_string(),
            "fetch error: product 9900115 page returned HTTP 503"
        );
    }
}
