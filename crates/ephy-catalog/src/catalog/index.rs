use super::domain::ProductRecord;
use super::normalizer::normalize_name;
use super::row::{CatalogColumns, RawRow};
use super::status::StatusRules;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// What to do when a row carries an id that is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Later rows replace earlier ones.
    #[default]
    Overwrite,
    /// Later rows are dropped and not indexed.
    KeepFirst,
    /// Later rows replace earlier ones but secondary names accumulate.
    Merge,
}

impl DuplicatePolicy {
    pub fn label(&self) -> &'static str {
        match self {
            DuplicatePolicy::Overwrite => "overwrite",
            DuplicatePolicy::KeepFirst => "keep-first",
            DuplicatePolicy::Merge => "merge",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "last-write-wins" => Ok(Self::Overwrite),
            "keep-first" | "reject" => Ok(Self::KeepFirst),
            "merge" => Ok(Self::Merge),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected overwrite, keep-first or merge)"
            )),
        }
    }
}

/// Knobs for a single index build.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub columns: CatalogColumns,
    pub secondary_delimiter: char,
    pub status_rules: StatusRules,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            columns: CatalogColumns::default(),
            secondary_delimiter: '|',
            status_rules: StatusRules::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Why a row never made it into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    MissingId,
    MissingPrimaryName,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingId => write!(f, "row has no product identifier"),
            RowRejection::MissingPrimaryName => write!(f, "row has no product name"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicate_ids: usize,
    /// Indexed rows carrying at least one secondary name. Rows rejected
    /// by the duplicate policy are not counted.
    pub rows_with_secondary: usize,
    /// Secondary names carried by those rows, before any merge.
    pub secondary_names: usize,
}

/// Splits a multi-valued name field, trimming pieces and dropping blanks.
pub fn split_secondary_names(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of an index build: products keyed by id plus the alias index.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    products: BTreeMap<String, Arc<ProductRecord>>,
    order: Vec<String>,
    aliases: BTreeMap<String, Vec<Arc<ProductRecord>>>,
    stats: BuildStats,
}

impl CatalogIndex {
    pub fn resolve_by_id(&self, id: &str) -> Option<&ProductRecord> {
        self.products.get(id.trim()).map(Arc::as_ref)
    }

    /// Distinct products (by id, first occurrence kept) indexed under the
    /// normalized form of `display`. Unknown names give an empty list.
    pub fn resolve_by_name(&self, display: &str) -> Vec<&ProductRecord> {
        let mut seen = HashSet::new();
        self.aliases(display)
            .iter()
            .map(Arc::as_ref)
            .filter(|record| seen.insert(record.id.as_str()))
            .collect()
    }

    /// Raw entries for a name, duplicates included.
    pub fn aliases(&self, display: &str) -> &[Arc<ProductRecord>] {
        self.aliases
            .get(&normalize_name(display))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Products in first-seen order.
    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.order
            .iter()
            .filter_map(|id| self.products.get(id))
            .map(Arc::as_ref)
    }

    pub fn products_by_id(&self) -> &BTreeMap<String, Arc<ProductRecord>> {
        &self.products
    }

    pub fn alias_index(&self) -> &BTreeMap<String, Vec<Arc<ProductRecord>>> {
        &self.aliases
    }

    pub fn alias_keys(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub(crate) fn from_parts(
        order: Vec<String>,
        products: BTreeMap<String, Arc<ProductRecord>>,
        aliases: BTreeMap<String, Vec<Arc<ProductRecord>>>,
    ) -> Self {
        Self {
            products,
            order,
            aliases,
            stats: BuildStats::default(),
        }
    }
}

/// Single-pass builder behind [`build_index`].
#[derive(Debug)]
pub struct AliasIndexBuilder<'a> {
    options: &'a IndexOptions,
    index: CatalogIndex,
}

impl<'a> AliasIndexBuilder<'a> {
    pub fn new(options: &'a IndexOptions) -> Self {
        Self {
            options,
            index: CatalogIndex::default(),
        }
    }

    /// Feeds one row. Malformed rows are counted and reported back, never
    /// fatal.
    pub fn push_row(&mut self, row: &RawRow) -> Result<(), RowRejection> {
        self.index.stats.rows_read += 1;

        let record = match self.record_from_row(row) {
            Ok(record) => record,
            Err(rejection) => {
                self.index.stats.rows_skipped += 1;
                debug!(row = self.index.stats.rows_read, %rejection, "skipping catalog row");
                return Err(rejection);
            }
        };

        self.store(record);
        Ok(())
    }

    pub fn finish(self) -> CatalogIndex {
        self.index
    }

    fn record_from_row(&self, row: &RawRow) -> Result<ProductRecord, RowRejection> {
        let columns = &self.options.columns;
        let field = |column: &str| row.get(column).map(str::trim).unwrap_or_default();

        let id = field(&columns.id);
        if id.is_empty() {
            return Err(RowRejection::MissingId);
        }
        let primary_name = field(&columns.primary_name);
        if primary_name.is_empty() {
            return Err(RowRejection::MissingPrimaryName);
        }

        let secondary_names =
            split_secondary_names(field(&columns.secondary_names), self.options.secondary_delimiter);
        let status_raw = columns.status(row).unwrap_or_default();
        let withdrawal_date = Some(field(&columns.withdrawal_date))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(ProductRecord {
            id: id.to_string(),
            primary_name: primary_name.to_string(),
            secondary_names,
            status: self.options.status_rules.classify(status_raw),
            withdrawal_date,
            substances: field(&columns.substances).to_string(),
            function: field(&columns.function).to_string(),
            formulation: field(&columns.formulation).to_string(),
            holder: field(&columns.holder).to_string(),
        })
    }

    fn store(&mut self, mut record: ProductRecord) {
        let index = &mut self.index;
        let carried = record.secondary_names.len();

        match index.products.get(&record.id) {
            None => index.order.push(record.id.clone()),
            Some(existing) => {
                index.stats.duplicate_ids += 1;
                match self.options.duplicate_policy {
                    DuplicatePolicy::Overwrite => {}
                    DuplicatePolicy::KeepFirst => {
                        debug!(id = %record.id, "duplicate id rejected, keeping first row");
                        return;
                    }
                    DuplicatePolicy::Merge => {
                        record.absorb_secondary_names(&existing.secondary_names);
                    }
                }
                debug!(id = %record.id, policy = %self.options.duplicate_policy, "duplicate id");
            }
        }

        if carried > 0 {
            index.stats.rows_with_secondary += 1;
            index.stats.secondary_names += carried;
        }

        let record = Arc::new(record);
        for key in record.normalized_names() {
            index.aliases.entry(key).or_default().push(Arc::clone(&record));
        }
        index.products.insert(record.id.clone(), record);
    }
}

/// Builds the product map and alias index from catalog rows in one pass.
pub fn build_index<'r, I>(rows: I, options: &IndexOptions) -> CatalogIndex
where
    I: IntoIterator<Item = &'r RawRow>,
{
    let mut builder = AliasIndexBuilder::new(options);
    for row in rows {
        let _ = builder.push_row(row);
    }
    builder.finish()
}
