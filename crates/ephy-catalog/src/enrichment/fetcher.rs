use reqwest::header;
use std::fmt::Debug;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request for product {id} failed: {message}")]
    Request { id: String, message: String },
    #[error("product {id} page returned HTTP {status}")]
    Status { id: String, status: u16 },
    #[error("http client unavailable: {0}")]
    Client(String),
}

/// Source of product detail pages, keyed by product id.
pub trait ProductPageSource: Debug {
    fn fetch_product_page(&self, id: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    /// Must contain `{amm}`.
    pub url_template: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            url_template: "https://ephy.anses.fr/ppp/{amm}".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl PortalSettings {
    pub fn product_url(&self, id: &str) -> String {
        self.url_template.replace("{amm}", id.trim())
    }
}

/// Blocking facade over an async `reqwest` client for the E-Phy portal.
pub struct EphyPortalClient {
    client: reqwest::Client,
    runtime: Runtime,
    settings: PortalSettings,
}

impl EphyPortalClient {
    pub fn new(settings: PortalSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            settings,
        })
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }
}

impl Debug for EphyPortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphyPortalClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ProductPageSource for EphyPortalClient {
    fn fetch_product_page(&self, id: &str) -> Result<String, FetchError> {
        let url = self.settings.product_url(id);
        debug!(%url, "fetching product page");

        let request_error = |err: reqwest::Error| FetchError::Request {
            id: id.to_string(),
            message: err.to_string(),
        };

        self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .header(header::ACCEPT, "text/html,application/xhtml+xml")
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    id: id.to_string(),
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(request_error)
        })
    }
}
