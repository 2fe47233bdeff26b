use super::normalizer::normalize_name;
use super::status::ProductStatus;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A product as shipped in the lookup database. Field names on the wire
/// follow the front-end's existing schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "amm")]
    pub id: String,
    #[serde(rename = "name")]
    pub primary_name: String,
    #[serde(
        rename = "secondaryNames",
        default,
        serialize_with = "empty_list_as_null",
        deserialize_with = "null_as_empty_list"
    )]
    pub secondary_names: Vec<String>,
    pub status: ProductStatus,
    #[serde(default)]
    pub withdrawal_date: Option<String>,
    #[serde(default)]
    pub substances: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub formulation: String,
    #[serde(default)]
    pub holder: String,
}

impl ProductRecord {
    /// Lookup keys this record is indexed under: the primary name first,
    /// then each secondary name. Names normalizing to nothing are dropped.
    pub fn normalized_names(&self) -> Vec<String> {
        std::iter::once(&self.primary_name)
            .chain(self.secondary_names.iter())
            .map(|name| normalize_name(name))
            .filter(|key| !key.is_empty())
            .collect()
    }

    pub(crate) fn absorb_secondary_names(&mut self, earlier: &[String]) {
        let mut merged: Vec<String> = earlier.to_vec();
        for name in self.secondary_names.drain(..) {
            if !merged.contains(&name) {
                merged.push(name);
            }
        }
        self.secondary_names = merged;
    }
}

fn empty_list_as_null<S>(names: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if names.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.collect_seq(names)
    }
}

fn null_as_empty_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(secondary: &[&str]) -> ProductRecord {
        ProductRecord {
            id: "9900115".to_string(),
            primary_name: "CENTURION R".to_string(),
            secondary_names: secondary.iter().map(|name| name.to_string()).collect(),
            status: ProductStatus::Authorized,
            withdrawal_date: None,
            substances: "clethodime".to_string(),
            function: "Herbicide".to_string(),
            formulation: String::new(),
            holder: String::new(),
        }
    }

    #[test]
    fn serializes_with_front_end_field_names() {
        let value = serde_json::to_value(record(&["FOO"])).expect("serializes");
        assert_eq!(value["amm"], json!("9900115"));
        assert_eq!(value["name"], json!("CENTURION R"));
        assert_eq!(value["secondaryNames"], json!(["FOO"]));
        assert_eq!(value["status"], json!("AUTHORIZED"));
        assert_eq!(value["withdrawal_date"], json!(null));
        assert_eq!(value["formulation"], json!(""));
    }

    #[test]
    fn empty_secondary_names_travel_as_null() {
        let value = serde_json::to_value(record(&[])).expect("serializes");
        assert_eq!(value["secondaryNames"], json!(null));

        let parsed: ProductRecord = serde_json::from_value(value).expect("parses");
        assert!(parsed.secondary_names.is_empty());
    }

    #[test]
    fn normalized_names_lists_primary_then_secondary() {
        let product = record(&["Foo\u{00ae}", " ", "BAR BAZ"]);
        assert_eq!(
            product.normalized_names(),
            vec!["centurion r", "foo", "bar baz"]
        );
    }

    #[test]
    fn absorbing_keeps_earlier_order_and_skips_repeats() {
        let mut product = record(&["BAR", "QUX"]);
        product.absorb_secondary_names(&["FOO".to_string(), "BAR".to_string()]);
        assert_eq!(product.secondary_names, vec!["FOO", "BAR", "QUX"]);
    }
}
