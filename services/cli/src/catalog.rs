use crate::infra::{catalog_importer, write_output};
use chrono::{Local, NaiveDateTime};
use clap::Args;
use ephy_catalog::catalog::{CatalogIndex, DuplicatePolicy, ProductRecord};
use ephy_catalog::config::AppConfig;
use ephy_catalog::database::{AliasTable, ProductDatabase};
use ephy_catalog::error::AppError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct BuildArgs {
    /// E-Phy `produits` CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Destination of the gzip-compressed JSON database
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Version string stored in the database (defaults to EPHY_DATABASE_VERSION or today)
    #[arg(long)]
    pub(crate) db_version: Option<String>,
    /// How repeated AMM numbers are handled: overwrite, keep-first or merge
    #[arg(long, value_parser = crate::infra::parse_duplicate_policy)]
    pub(crate) duplicates: Option<DuplicatePolicy>,
    /// AMM number to print after the build (repeatable)
    #[arg(long)]
    pub(crate) inspect: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct AliasesArgs {
    /// E-Phy `produits` CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Destination of the generated TypeScript module
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Optional JSON sidecar mapping each alias to its AMM number
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    /// How repeated AMM numbers are handled: overwrite, keep-first or merge
    #[arg(long, value_parser = crate::infra::parse_duplicate_policy)]
    pub(crate) duplicates: Option<DuplicatePolicy>,
}

pub(crate) fn run_build(args: BuildArgs, config: &AppConfig) -> Result<(), AppError> {
    let BuildArgs {
        csv,
        output,
        db_version,
        duplicates,
        inspect,
    } = args;

    let index = catalog_importer(&config.catalog, duplicates).import_path(&csv)?;
    let version = db_version.unwrap_or_else(|| config.catalog.database_version.clone());
    let database = ProductDatabase::from_index(&index, version);

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    database.save(&output)?;

    print!("{}", render_build_summary(&index, &database, &output, &inspect));
    Ok(())
}

pub(crate) fn run_aliases(args: AliasesArgs, config: &AppConfig) -> Result<(), AppError> {
    let AliasesArgs {
        csv,
        output,
        json,
        duplicates,
    } = args;

    let index = catalog_importer(&config.catalog, duplicates).import_path(&csv)?;
    let table = AliasTable::from_index(&index);

    let typescript = table.render_typescript(&source_label(&csv), generated_at())?;
    write_output(&output, &typescript)?;
    if let Some(json) = &json {
        write_output(json, &table.to_json()?)?;
    }

    println!("Alias table generated");
    println!(
        "- {} products with secondary names",
        index
            .products()
            .filter(|product| !product.secondary_names.is_empty())
            .count()
    );
    println!("- {} aliases written to {}", table.len(), output.display());
    if let Some(json) = json {
        println!("- JSON sidecar: {}", json.display());
    }
    Ok(())
}

fn generated_at() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn render_build_summary(
    index: &CatalogIndex,
    database: &ProductDatabase,
    output: &Path,
    inspect: &[String],
) -> String {
    let stats = index.stats();
    let mut out = String::new();
    writeln!(&mut out, "Product database built").expect("write heading");
    writeln!(&mut out, "- Version: {}", database.version).expect("write version");
    writeln!(&mut out, "- Rows read: {}", stats.rows_read).expect("write rows");
    writeln!(&mut out, "- Unique products: {}", database.total).expect("write products");
    writeln!(&mut out, "- Name keys: {}", database.index.by_name.len()).expect("write keys");
    writeln!(
        &mut out,
        "- Rows with secondary names: {} ({} names)",
        stats.rows_with_secondary, stats.secondary_names
    )
    .expect("write secondary counts");
    writeln!(&mut out, "- Skipped rows: {}", stats.rows_skipped).expect("write skipped");
    writeln!(&mut out, "- Duplicate ids: {}", stats.duplicate_ids).expect("write duplicates");
    writeln!(&mut out, "- Output: {}", output.display()).expect("write output path");

    for id in inspect {
        out.push('\n');
        match index.resolve_by_id(id) {
            Some(product) => out.push_str(&render_product(product)),
            None => writeln!(&mut out, "AMM {id}: not found").expect("write missing id"),
        }
    }
    out
}

pub(crate) fn render_product(product: &ProductRecord) -> String {
    let mut out = String::new();
    writeln!(&mut out, "AMM {}: {}", product.id, product.primary_name).expect("write headline");
    writeln!(&mut out, "  Status: {}", product.status).expect("write status");
    if !product.secondary_names.is_empty() {
        writeln!(
            &mut out,
            "  Secondary names: {}",
            product.secondary_names.join(", ")
        )
        .expect("write secondary names");
    }
    if let Some(date) = &product.withdrawal_date {
        writeln!(&mut out, "  Withdrawn: {date}").expect("write withdrawal date");
    }
    for (label, value) in [
        ("Substances", &product.substances),
        ("Function", &product.function),
        ("Formulation", &product.formulation),
        ("Holder", &product.holder),
    ] {
        if !value.is_empty() {
            writeln!(&mut out, "  {label}: {value}").expect("write descriptive field");
        }
    }
    out
}
