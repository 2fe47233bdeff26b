mod extract;
mod fetcher;

pub use extract::extract_secondary_names;
pub use fetcher::{EphyPortalClient, FetchError, PortalSettings, ProductPageSource};

use crate::catalog::{ProductRecord, ProductStatus};
use crate::database::{AliasTable, ProductDatabase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const PROGRESS_EVERY: usize = 100;
pub const RESULTS_FILE_NAME: &str = "secondary_names_complete.json";

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode scrape results: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub limit: usize,
    pub delay: Duration,
    /// 0 disables checkpoints.
    pub checkpoint_every: usize,
    pub output_dir: PathBuf,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            limit: 1000,
            delay: Duration::from_millis(500),
            checkpoint_every: 500,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub primary_name: String,
    pub secondary_names: Vec<String>,
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub processed: usize,
    pub with_secondary: usize,
    pub errors: usize,
    pub checkpoints: usize,
    pub elapsed: Duration,
}

/// Scraped secondary names keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub results: BTreeMap<String, ScrapedProduct>,
    pub summary: ScrapeSummary,
}

impl ScrapeReport {
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::new();
        for (id, product) in &self.results {
            table.insert_all(id, &product.primary_name, &product.secondary_names);
        }
        table
    }

    pub fn save_results<P: AsRef<Path>>(&self, path: P) -> Result<(), ScrapeError> {
        write_json(path.as_ref(), &self.results)
    }
}

/// Walks the products of a database, fetching each product page and
/// collecting the secondary names it lists.
#[derive(Debug)]
pub struct SecondaryNameScraper<'a> {
    source: &'a dyn ProductPageSource,
    settings: ScrapeSettings,
}

impl<'a> SecondaryNameScraper<'a> {
    pub fn new(source: &'a dyn ProductPageSource, settings: ScrapeSettings) -> Self {
        Self { source, settings }
    }

    pub fn checkpoint_path(&self, processed: usize) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("secondary_names_checkpoint_{processed}.json"))
    }

    pub fn run(&self, database: &ProductDatabase) -> ScrapeReport {
        let batch: Vec<&ProductRecord> = database.products.iter().take(self.settings.limit).collect();
        let planned = batch.len();
        info!(
            products = planned,
            available = database.products.len(),
            delay_ms = self.settings.delay.as_millis() as u64,
            "starting secondary name scrape"
        );

        let started = Instant::now();
        let mut report = ScrapeReport::default();

        for (position, product) in batch.into_iter().enumerate() {
            if position > 0 && !self.settings.delay.is_zero() {
                std::thread::sleep(self.settings.delay);
            }

            self.scrape_product(product, &mut report);
            let processed = report.summary.processed;

            if processed % PROGRESS_EVERY == 0 {
                log_progress(&report.summary, planned, started.elapsed());
            }

            if self.settings.checkpoint_every > 0 && processed % self.settings.checkpoint_every == 0
            {
                let path = self.checkpoint_path(processed);
                match write_json(&path, &report.results) {
                    Ok(()) => {
                        report.summary.checkpoints += 1;
                        info!(path = %path.display(), processed, "checkpoint saved");
                    }
                    Err(err) => warn!(%err, "checkpoint not saved, continuing"),
                }
            }
        }

        report.summary.elapsed = started.elapsed();
        info!(
            processed = report.summary.processed,
            with_secondary = report.summary.with_secondary,
            errors = report.summary.errors,
            elapsed_secs = report.summary.elapsed.as_secs(),
            "secondary name scrape finished"
        );
        report
    }

    fn scrape_product(&self, product: &ProductRecord, report: &mut ScrapeReport) {
        report.summary.processed += 1;

        let html = match self.source.fetch_product_page(&product.id) {
            Ok(html) => html,
            Err(err) => {
                report.summary.errors += 1;
                warn!(id = %product.id, %err, "skipping product page");
                return;
            }
        };

        let secondary_names = extract_secondary_names(&html);
        if secondary_names.is_empty() {
            return;
        }

        info!(
            id = %product.id,
            name = %product.primary_name,
            names = %secondary_names.join(", "),
            "secondary names found"
        );
        report.summary.with_secondary += 1;
        report.results.insert(
            product.id.clone(),
            ScrapedProduct {
                primary_name: product.primary_name.clone(),
                secondary_names,
                status: product.status,
            },
        );
    }
}

fn log_progress(summary: &ScrapeSummary, planned: usize, elapsed: Duration) {
    let rate = summary.processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    let remaining = planned.saturating_sub(summary.processed) as f64 / rate;
    info!(
        processed = summary.processed,
        planned,
        percent = %format!("{:.1}", summary.processed as f64 * 100.0 / planned.max(1) as f64),
        found = summary.with_secondary,
        errors = summary.errors,
        remaining_min = %format!("{:.0}", remaining / 60.0),
        "scrape progress"
    );
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ScrapeError> {
    let io_error = |source| ScrapeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_error)
}
