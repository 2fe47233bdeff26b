use super::normalizer::fold_for_matching;

/// One catalog line as column/value pairs, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Value of the column whose trimmed name equals `column`, ignoring case.
    pub fn get(&self, column: &str) -> Option<&str> {
        let wanted = column.trim();
        self.fields
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first column whose folded name contains every keyword.
    pub fn find(&self, keywords: &[&str]) -> Option<&str> {
        let keywords: Vec<String> = keywords.iter().map(|kw| fold_for_matching(kw)).collect();
        self.fields
            .iter()
            .find(|(name, _)| {
                let folded = fold_for_matching(name);
                keywords.iter().all(|kw| folded.contains(kw.as_str()))
            })
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// Where each product field lives in the catalog export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumns {
    pub id: String,
    pub primary_name: String,
    pub secondary_names: String,
    /// Every keyword must appear in the status column name.
    pub status_keywords: Vec<String>,
    pub withdrawal_date: String,
    pub substances: String,
    pub function: String,
    pub formulation: String,
    pub holder: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            id: "numero AMM".to_string(),
            primary_name: "nom produit".to_string(),
            secondary_names: "seconds noms commerciaux".to_string(),
            status_keywords: vec!["etat".to_string(), "autorisation".to_string()],
            withdrawal_date: "Date de retrait du produit".to_string(),
            substances: "Substances actives".to_string(),
            function: "fonctions".to_string(),
            formulation: "formulations".to_string(),
            holder: "titulaire".to_string(),
        }
    }
}

impl CatalogColumns {
    pub(crate) fn status<'a>(&self, row: &'a RawRow) -> Option<&'a str> {
        let keywords: Vec<&str> = self.status_keywords.iter().map(String::as_str).collect();
        row.find(&keywords)
    }
}
