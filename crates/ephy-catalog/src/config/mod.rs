use crate::catalog::{DuplicatePolicy, StatusRules};
use crate::enrichment::PortalSettings;
use chrono::Local;
use encoding_rs::Encoding;
use std::env;
use std::fmt;
use std::time::Duration;

/// Top-level configuration for the catalog tools.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub scrape: ScrapeConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("EPHY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let encoding_label =
            env::var("EPHY_CSV_ENCODING").unwrap_or_else(|_| "windows-1252".to_string());
        let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
            .ok_or(ConfigError::UnknownEncoding(encoding_label))?;

        let duplicate_policy = match env::var("EPHY_DUPLICATE_POLICY") {
            Ok(raw) => raw
                .parse::<DuplicatePolicy>()
                .map_err(ConfigError::InvalidDuplicatePolicy)?,
            Err(_) => DuplicatePolicy::default(),
        };

        let status_rules = match env::var("EPHY_STATUS_TOKENS") {
            Ok(raw) => StatusRules::parse(&raw).map_err(ConfigError::InvalidStatusTokens)?,
            Err(_) => StatusRules::default(),
        };

        let catalog_defaults = CatalogConfig::default();
        let database_version = env::var("EPHY_DATABASE_VERSION")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(catalog_defaults.database_version);

        let scrape_defaults = ScrapeConfig::default();
        let defaults = scrape_defaults.portal;
        let url_template = env::var("EPHY_PORTAL_URL").unwrap_or(defaults.url_template);
        if !url_template.contains("{amm}") {
            return Err(ConfigError::InvalidPortalUrl(url_template));
        }
        let user_agent = env::var("EPHY_USER_AGENT").unwrap_or(defaults.user_agent);
        let timeout = Duration::from_secs(parse_number(
            "EPHY_SCRAPE_TIMEOUT_SECS",
            defaults.timeout.as_secs(),
        )?);

        Ok(Self {
            catalog: CatalogConfig {
                encoding,
                duplicate_policy,
                status_rules,
                database_version,
            },
            scrape: ScrapeConfig {
                portal: PortalSettings {
                    url_template,
                    user_agent,
                    timeout,
                },
                delay: Duration::from_millis(parse_number(
                    "EPHY_SCRAPE_DELAY_MS",
                    scrape_defaults.delay.as_millis() as u64,
                )?),
                limit: parse_number("EPHY_SCRAPE_LIMIT", scrape_defaults.limit)?,
                checkpoint_every: parse_number(
                    "EPHY_CHECKPOINT_EVERY",
                    scrape_defaults.checkpoint_every,
                )?,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// How the catalog export is read and indexed.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub encoding: &'static Encoding,
    pub duplicate_policy: DuplicatePolicy,
    pub status_rules: StatusRules,
    pub database_version: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
            duplicate_policy: DuplicatePolicy::default(),
            status_rules: StatusRules::default(),
            database_version: Local::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Settings for the product page scraper.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub portal: PortalSettings,
    pub delay: Duration,
    pub limit: usize,
    pub checkpoint_every: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            portal: PortalSettings::default(),
            delay: Duration::from_millis(500),
            limit: 1000,
            checkpoint_every: 500,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    UnknownEncoding(String),
    InvalidDuplicatePolicy(String),
    InvalidStatusTokens(String),
    InvalidPortalUrl(String),
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownEncoding(label) => {
                write!(f, "EPHY_CSV_ENCODING '{label}' is not a known encoding label")
            }
            ConfigError::InvalidDuplicatePolicy(reason) => {
                write!(f, "EPHY_DUPLICATE_POLICY is invalid: {reason}")
            }
            ConfigError::InvalidStatusTokens(reason) => {
                write!(f, "EPHY_STATUS_TOKENS is invalid: {reason}")
            }
            ConfigError::InvalidPortalUrl(url) => {
                write!(f, "EPHY_PORTAL_URL '{url}' must contain the {{amm}} placeholder")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
