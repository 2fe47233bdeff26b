use crate::catalog::source_label;
use crate::infra::write_output;
use chrono::Local;
use clap::Args;
use ephy_catalog::config::AppConfig;
use ephy_catalog::database::ProductDatabase;
use ephy_catalog::enrichment::{
    EphyPortalClient, ProductPageSource, ScrapeReport, ScrapeSettings, SecondaryNameScraper,
    RESULTS_FILE_NAME,
};
use ephy_catalog::error::AppError;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TYPESCRIPT_FILE_NAME: &str = "secondary-names-complete.ts";

#[derive(Args, Debug)]
pub(crate) struct ScrapeArgs {
    /// Product database produced by `build`
    #[arg(long)]
    pub(crate) database: PathBuf,
    /// Directory receiving checkpoints and the final results
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
    /// Maximum number of products to fetch (defaults to EPHY_SCRAPE_LIMIT)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Pause between two fetches in milliseconds (defaults to EPHY_SCRAPE_DELAY_MS)
    #[arg(long)]
    pub(crate) delay_ms: Option<u64>,
    /// Write a checkpoint every N products, 0 disables (defaults to EPHY_CHECKPOINT_EVERY)
    #[arg(long)]
    pub(crate) checkpoint_every: Option<usize>,
    /// Where to write the TypeScript alias module (defaults to <output-dir>/secondary-names-complete.ts)
    #[arg(long)]
    pub(crate) typescript: Option<PathBuf>,
}

pub(crate) fn run_scrape(args: ScrapeArgs, config: &AppConfig) -> Result<(), AppError> {
    let client = EphyPortalClient::new(config.scrape.portal.clone())?;
    scrape_with(&client, args, config)
}

fn scrape_with(
    source: &dyn ProductPageSource,
    args: ScrapeArgs,
    config: &AppConfig,
) -> Result<(), AppError> {
    let ScrapeArgs {
        database,
        output_dir,
        limit,
        delay_ms,
        checkpoint_every,
        typescript,
    } = args;

    let products = ProductDatabase::load(&database)?;
    std::fs::create_dir_all(&output_dir)?;

    let settings = ScrapeSettings {
        limit: limit.unwrap_or(config.scrape.limit),
        delay: delay_ms
            .map(Duration::from_millis)
            .unwrap_or(config.scrape.delay),
        checkpoint_every: checkpoint_every.unwrap_or(config.scrape.checkpoint_every),
        output_dir: output_dir.clone(),
    };
    let report = SecondaryNameScraper::new(source, settings).run(&products);

    let results = output_dir.join(RESULTS_FILE_NAME);
    report.save_results(&results)?;

    let typescript = typescript.unwrap_or_else(|| output_dir.join(TYPESCRIPT_FILE_NAME));
    let table = report.alias_table();
    let rendered = table.render_typescript(
        &format!("{} (product pages)", source_label(&database)),
        Local::now().naive_local(),
    )?;
    write_output(&typescript, &rendered)?;

    render_scrape_summary(&report, &results, &typescript, table.len());
    Ok(())
}

fn render_scrape_summary(report: &ScrapeReport, results: &Path, typescript: &Path, aliases: usize) {
    let summary = &report.summary;
    println!("Secondary name scrape finished");
    println!(
        "- {} products processed in {:.1} min",
        summary.processed,
        summary.elapsed.as_secs_f64() / 60.0
    );
    println!("- {} products with secondary names", summary.with_secondary);
    println!("- {} fetch errors", summary.errors);
    println!("- {} checkpoints written", summary.checkpoints);
    println!("- Results: {}", results.display());
    println!("- {} aliases written to {}", aliases, typescript.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::test_config;
    use ephy_catalog::catalog::{build_index, IndexOptions, RawRow};
    use ephy_catalog::enrichment::FetchError;
    use std::collections::BTreeMap;
    use std::fs;

    #[derive(Debug)]
    struct StaticPages(BTreeMap<&'static str, &'static str>);

    impl ProductPageSource for StaticPages {
        fn fetch_product_page(&self, id: &str) -> Result<String, FetchError> {
            self.0
                .get(id)
                .map(|html| html.to_string())
                .ok_or_else(|| FetchError::Status {
                    id: id.to_string(),
                    status: 404,
                })
        }
    }

    fn saved_database(dir: &Path) -> PathBuf {
        let rows = [
            RawRow::new()
                .with("numero AMM", "9900115")
                .with("nom produit", "CENTURION R")
                .with("Etat d'autorisation", "Autorisé"),
            RawRow::new()
                .with("numero AMM", "2000001")
                .with("nom produit", "OLD PRODUCT")
                .with("Etat d'autorisation", "Retiré"),
        ];
        let database =
            ProductDatabase::from_index(&build_index(&rows, &IndexOptions::default()), "test");
        let path = dir.join("ephy-products.json.gz");
        database.save(&path).expect("database saved");
        path
    }

    #[test]
    fn scrape_writes_results_and_alias_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = saved_database(dir.path());
        let output_dir = dir.path().join("scrape");
        let pages = StaticPages(BTreeMap::from([(
            "9900115",
            "<td>Seconds noms commerciaux : FOO, BAR BAZ</td>",
        )]));

        scrape_with(
            &pages,
            ScrapeArgs {
                database,
                output_dir: output_dir.clone(),
                limit: None,
                delay_ms: Some(0),
                checkpoint_every: Some(1),
                typescript: None,
            },
            &test_config(),
        )
        .expect("scrape succeeds");

        let results: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output_dir.join(RESULTS_FILE_NAME)).expect("results written"),
        )
        .expect("results parse");
        assert_eq!(results["9900115"]["secondary_names"][1], "BAR BAZ");
        assert!(results.get("2000001").is_none());

        assert!(output_dir.join("secondary_names_checkpoint_1.json").exists());
        assert!(output_dir.join("secondary_names_checkpoint_2.json").exists());

        let ts = fs::read_to_string(output_dir.join(TYPESCRIPT_FILE_NAME)).expect("ts written");
        assert!(ts.contains("\"bar baz\": \"9900115\", // CENTURION R"));
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pages = StaticPages(BTreeMap::new());
        let result = scrape_with(
            &pages,
            ScrapeArgs {
                database: dir.path().join("absent.json.gz"),
                output_dir: dir.path().to_path_buf(),
                limit: None,
                delay_ms: None,
                checkpoint_every: None,
                typescript: None,
            },
            &test_config(),
        );
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
