mod aliases;

pub use aliases::{AliasEntry, AliasTable};

use crate::catalog::{CatalogIndex, ProductRecord};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub enum DatabaseError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::Io(err) => write!(f, "database file error: {}", err),
            DatabaseError::Json(err) => write!(f, "invalid database document: {}", err),
        }
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatabaseError::Io(err) => Some(err),
            DatabaseError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DatabaseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// The lookup database shipped to the front-end as gzip-compressed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDatabase {
    pub version: String,
    pub total: usize,
    pub products: Vec<ProductRecord>,
    pub index: DatabaseIndex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseIndex {
    /// Older generators and the front-end name this map `by_amm`.
    #[serde(alias = "by_amm")]
    pub by_id: BTreeMap<String, ProductRecord>,
    pub by_name: BTreeMap<String, Vec<ProductRecord>>,
}

impl ProductDatabase {
    pub fn from_index(index: &CatalogIndex, version: impl Into<String>) -> Self {
        let by_id = index
            .products_by_id()
            .iter()
            .map(|(id, record)| (id.clone(), ProductRecord::clone(record)))
            .collect();
        let by_name = index
            .alias_index()
            .iter()
            .map(|(key, records)| {
                let records = records
                    .iter()
                    .map(|record| ProductRecord::clone(record))
                    .collect();
                (key.clone(), records)
            })
            .collect();

        Self {
            version: version.into(),
            total: index.len(),
            products: index.products().cloned().collect(),
            index: DatabaseIndex { by_id, by_name },
        }
    }

    /// Rebuilds a queryable index from a loaded document. `products` fixes
    /// the order; ids only present in `by_id` are appended after it.
    pub fn to_index(&self) -> CatalogIndex {
        let mut order: Vec<String> = Vec::with_capacity(self.index.by_id.len());
        let mut products: BTreeMap<String, Arc<ProductRecord>> = BTreeMap::new();

        for record in &self.products {
            if !products.contains_key(&record.id) {
                order.push(record.id.clone());
            }
            products.insert(record.id.clone(), Arc::new(record.clone()));
        }
        for (id, record) in &self.index.by_id {
            if !products.contains_key(id) {
                order.push(id.clone());
            }
            products.insert(id.clone(), Arc::new(record.clone()));
        }

        let aliases: BTreeMap<String, Vec<Arc<ProductRecord>>> = self
            .index
            .by_name
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(key, records)| {
                let records = records.iter().cloned().map(Arc::new).collect();
                (key.clone(), records)
            })
            .collect();

        CatalogIndex::from_parts(order, products, aliases)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), DatabaseError> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, DatabaseError> {
        let decoder = GzDecoder::new(reader);
        Ok(serde_json::from_reader(BufReader::new(decoder))?)
    }

    /// Replaces whatever was at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        info!(path = %path.display(), products = self.total, version = %self.version, "database written");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let database = Self::read_from(File::open(path)?)?;
        info!(path = %path.display(), products = database.total, version = %database.version, "database loaded");
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_index, IndexOptions, RawRow};

    fn sample_index() -> CatalogIndex {
        let rows = vec![
            RawRow::new()
                .with("numero AMM", "9900115")
                .with("nom produit", "CENTURION R")
                .with("seconds noms commerciaux", "FOO|BAR BAZ")
                .with("Etat d'autorisation", "Autorisé"),
            RawRow::new()
                .with("numero AMM", "2000001")
                .with("nom produit", "FOO")
                .with("Etat d'autorisation", "Retiré")
                .with("Date de retrait du produit", "2019-06-30"),
        ];
        build_index(&rows, &IndexOptions::default())
    }

    #[test]
    fn document_has_expected_shape() {
        let database = ProductDatabase::from_index(&sample_index(), "2026-01-27");
        let value = serde_json::to_value(&database).expect("serializes");

        assert_eq!(value["version"], "2026-01-27");
        assert_eq!(value["total"], 2);
        assert_eq!(value["products"][0]["amm"], "9900115");
        assert_eq!(value["index"]["by_id"]["2000001"]["status"], "RETIRED");
        assert_eq!(
            value["index"]["by_name"]["foo"]
                .as_array()
                .expect("foo entries")
                .len(),
            2
        );
    }

    #[test]
    fn gzip_round_trip_preserves_maps() {
        let index = sample_index();
        let database = ProductDatabase::from_index(&index, "test");

        let mut bytes = Vec::new();
        database.write_to(&mut bytes).expect("writes");
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let loaded = ProductDatabase::read_from(&bytes[..]).expect("reads");
        assert_eq!(loaded, database);

        let rebuilt = loaded.to_index();
        assert_eq!(
            rebuilt.products_by_id().keys().collect::<Vec<_>>(),
            index.products_by_id().keys().collect::<Vec<_>>()
        );
        assert_eq!(
            rebuilt.alias_keys().collect::<Vec<_>>(),
            index.alias_keys().collect::<Vec<_>>()
        );
        assert_eq!(rebuilt.resolve_by_name("Foo").len(), 2);
        assert_eq!(
            rebuilt.products().map(|p| p.id.clone()).collect::<Vec<_>>(),
            vec!["9900115", "2000001"]
        );
    }

    #[test]
    fn rejects_plain_json() {
        let error = ProductDatabase::read_from(&b"{\"version\":\"x\"}"[..]).expect_err("not gzip");
        assert!(matches!(error, DatabaseError::Json(_) | DatabaseError::Io(_)));
    }

    #[test]
    fn loads_documents_keyed_by_amm() {
        let legacy = r#"{
            "version": "2025-11-02",
            "total": 1,
            "products": [
                {"amm": "9900115", "name": "CENTURION R", "secondaryNames": null,
                 "status": "AUTHORIZED", "withdrawal_date": null, "substances": "",
                 "function": "", "formulation": "", "holder": ""}
            ],
            "index": {
                "by_amm": {
                    "9900115": {"amm": "9900115", "name": "CENTURION R", "secondaryNames": null,
                                "status": "AUTHORIZED", "withdrawal_date": null, "substances": "",
                                "function": "", "formulation": "", "holder": ""}
                },
                "by_name": {}
            }
        }"#;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(legacy.as_bytes()).expect("compresses");
        let bytes = encoder.finish().expect("finishes");

        let database = ProductDatabase::read_from(&bytes[..]).expect("legacy document loads");
        assert_eq!(database.index.by_id.len(), 1);
        assert_eq!(
            database.to_index().resolve_by_id("9900115").map(|p| p.primary_name.as_str()),
            Some("CENTURION R")
        );

        let rewritten = serde_json::to_value(&database).expect("serializes");
        assert!(rewritten["index"]["by_id"]["9900115"].is_object());
        assert!(rewritten["index"].get("by_amm").is_none());
    }
}
