use crate::catalog::{normalize_name, CatalogIndex};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub id: String,
    pub primary_name: String,
}

/// Flat secondary-name → product id table for the front-end. Later
/// insertions win when two products share a secondary name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every secondary name of every product, in product order.
    pub fn from_index(index: &CatalogIndex) -> Self {
        let mut table = Self::new();
        for product in index.products() {
            table.insert_all(&product.id, &product.primary_name, &product.secondary_names);
        }
        table
    }

    pub fn insert_all(&mut self, id: &str, primary_name: &str, secondary_names: &[String]) {
        for name in secondary_names {
            self.insert(name, id, primary_name);
        }
    }

    /// Returns false when the name normalizes to nothing.
    pub fn insert(&mut self, secondary_name: &str, id: &str, primary_name: &str) -> bool {
        let key = normalize_name(secondary_name);
        if key.is_empty() {
            return false;
        }
        self.entries.insert(
            key,
            AliasEntry {
                id: id.to_string(),
                primary_name: primary_name.to_string(),
            },
        );
        true
    }

    pub fn lookup_id(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&normalize_name(name))
            .map(|entry| entry.id.as_str())
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// `{ "alias": "id" }`, sorted by alias.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let flat: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.id.as_str()))
            .collect();
        serde_json::to_string_pretty(&flat)
    }

    /// Renders a TypeScript module exposing `SECONDARY_NAMES`,
    /// `lookupIdByAlias` and `isKnownAlias`.
    pub fn render_typescript(
        &self,
        source: &str,
        generated_at: NaiveDateTime,
    ) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        writeln!(&mut out, "/**").expect("write header");
        writeln!(&mut out, " * Secondary commercial names of E-Phy products.").expect("write header");
        writeln!(&mut out, " *").expect("write header");
        writeln!(&mut out, " * Source: {}", single_line(source)).expect("write source");
        writeln!(
            &mut out,
            " * Generated: {}",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        )
        .expect("write timestamp");
        writeln!(&mut out, " * Do not edit by hand.").expect("write header");
        writeln!(&mut out, " */").expect("write header");
        out.push('\n');
        out.push_str("export const SECONDARY_NAMES: Record<string, string> = {\n");
        for (key, entry) in self.iter() {
            writeln!(
                &mut out,
                "  {}: {}, // {}",
                serde_json::to_string(key)?,
                serde_json::to_string(&entry.id)?,
                single_line(&entry.primary_name)
            )
            .expect("write alias entry");
        }
        out.push_str("};\n");
        out.push_str(TYPESCRIPT_LOOKUPS);
        Ok(out)
    }
}

fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect::<String>()
        .replace("*/", "* /")
}

const TYPESCRIPT_LOOKUPS: &str = r#"
function normalizeAlias(name: string): string {
  return name.replace(/[®™©]/g, '').toLowerCase().trim();
}

/**
 * Product id (AMM) registered under a secondary name, or null.
 */
export function lookupIdByAlias(name: string): string | null {
  const key = normalizeAlias(name);
  return Object.prototype.hasOwnProperty.call(SECONDARY_NAMES, key)
    ? SECONDARY_NAMES[key]
    : null;
}

/**
 * Whether the name is a known secondary name.
 */
export function isKnownAlias(name: string): boolean {
  return lookupIdByAlias(name) !== null;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 27)
            .expect("valid date")
            .and_hms_opt(9, 30, 0)
            .expect("valid time")
    }

    #[test]
    fn later_products_win_shared_aliases() {
        let mut table = AliasTable::new();
        table.insert_all("1", "ALPHA", &["Shared".to_string(), "ONLY A".to_string()]);
        table.insert_all("2", "BETA", &["SHARED\u{00ae}".to_string()]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup_id("  shared "), Some("2"));
        assert_eq!(table.lookup_id("Only A"), Some("1"));
        assert!(table.is_known("ONLY A\u{2122}"));
        assert!(!table.is_known("ALPHA"));
        assert!(!table.insert("\u{00a9}", "3", "GAMMA"));
    }

    #[test]
    fn typescript_is_sorted_and_escaped() {
        let mut table = AliasTable::new();
        table.insert("ZETA", "2", "BETA");
        table.insert("Al \"Quoted\" \\ Name", "1", "ALPHA\nNEXT");

        let ts = table
            .render_typescript("produits_Windows-1252.csv", generated_at())
            .expect("renders");

        let first = ts.find("\"al \\\"quoted\\\" \\\\ name\": \"1\", // ALPHA NEXT").expect("escaped entry");
        let second = ts.find("\"zeta\": \"2\", // BETA").expect("zeta entry");
        assert!(first < second);
        assert!(ts.contains("Generated: 2026-01-27 09:30:00"));
        assert!(ts.contains("export function lookupIdByAlias(name: string): string | null"));
        assert!(ts.contains("export function isKnownAlias(name: string): boolean"));
    }

    #[test]
    fn json_sidecar_maps_alias_to_id() {
        let mut table = AliasTable::new();
        table.insert("Foo", "9900115", "CENTURION R");
        let json: BTreeMap<String, String> =
            serde_json::from_str(&table.to_json().expect("json")).expect("parses");
        assert_eq!(json.get("foo").map(String::as_str), Some("9900115"));
    }
}
