mod domain;
mod index;
mod normalizer;
mod parser;
mod row;
mod status;

pub use domain::ProductRecord;
pub use index::{
    build_index, split_secondary_names, AliasIndexBuilder, BuildStats, CatalogIndex,
    DuplicatePolicy, IndexOptions, RowRejection,
};
pub use normalizer::normalize_name;
pub use row::{CatalogColumns, RawRow};
pub use status::{ProductStatus, StatusRules};

use encoding_rs::Encoding;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads an E-Phy `produits` export and builds the catalog index from it.
#[derive(Debug, Clone)]
pub struct CatalogImporter {
    encoding: &'static Encoding,
    options: IndexOptions,
}

impl Default for CatalogImporter {
    fn default() -> Self {
        Self::new(encoding_rs::WINDOWS_1252, IndexOptions::default())
    }
}

impl CatalogImporter {
    pub fn new(encoding: &'static Encoding, options: IndexOptions) -> Self {
        Self { encoding, options }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn import_path<P: AsRef<Path>>(&self, path: P) -> Result<CatalogIndex, CatalogImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        info!(path = %path.display(), encoding = self.encoding.name(), "reading catalog export");
        self.import_reader(file)
    }

    pub fn import_reader<R: Read>(&self, reader: R) -> Result<CatalogIndex, CatalogImportError> {
        let rows = parser::parse_rows(reader, self.encoding)?;
        if let Some(first) = rows.first() {
            if first.get(&self.options.columns.id).is_none() {
                warn!(
                    column = %self.options.columns.id,
                    "identifier column not found in header, every row will be skipped"
                );
            }
        }

        let index = build_index(&rows, &self.options);
        let stats = index.stats();
        info!(
            rows = stats.rows_read,
            products = index.len(),
            name_keys = index.alias_index().len(),
            skipped = stats.rows_skipped,
            duplicates = stats.duplicate_ids,
            "catalog indexed"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "numero AMM;nom produit;seconds noms commerciaux;Etat d'autorisation;Date de retrait du produit;Substances actives;fonctions;formulations;titulaire\n";

    #[test]
    fn importer_reads_semicolon_export() {
        let csv = format!(
            "{HEADER}9900115;CENTURION R;FOO|BAR BAZ;Autorisé;;clethodime;Herbicide;EC;ACME\n\
2000001;OLD PRODUCT;;Retiré;2019-06-30;cuivre;Fongicide;WP;BETA SA\n"
        );
        let index = CatalogImporter::new(encoding_rs::UTF_8, IndexOptions::default())
            .import_reader(Cursor::new(csv))
            .expect("import succeeds");

        assert_eq!(index.len(), 2);
        let centurion = index.resolve_by_id("9900115").expect("centurion");
        assert_eq!(centurion.formulation, "EC");
        let old = index.resolve_by_id("2000001").expect("old product");
        assert_eq!(old.status, ProductStatus::Retired);
        assert_eq!(old.withdrawal_date.as_deref(), Some("2019-06-30"));
    }

    #[test]
    fn import_path_propagates_io_errors() {
        let error = CatalogImporter::default()
            .import_path("./does-not-exist.csv")
            .expect_err("expected io error");

        match error {
            CatalogImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn missing_identifier_column_skips_every_row() {
        let csv = "AMM;nom produit\n1;ALPHA\n2;BETA\n";
        let index = CatalogImporter::default()
            .import_reader(Cursor::new(csv))
            .expect("import succeeds");
        assert!(index.is_empty());
        assert_eq!(index.stats().rows_skipped, 2);
    }
}
