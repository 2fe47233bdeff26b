use super::normalizer::fold_for_matching;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization state of a product, derived from the catalog's free-text
/// status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Authorized,
    Retired,
    Unknown,
}

impl ProductStatus {
    /// Classification order: the first status with a matching token wins.
    const PRECEDENCE: [ProductStatus; 2] = [ProductStatus::Authorized, ProductStatus::Retired];

    pub fn label(&self) -> &'static str {
        match self {
            ProductStatus::Authorized => "AUTHORIZED",
            ProductStatus::Retired => "RETIRED",
            ProductStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AUTHORIZED" => Ok(Self::Authorized),
            "RETIRED" => Ok(Self::Retired),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(format!("unknown product status '{other}'")),
        }
    }
}

/// Token table driving the status classifier.
///
/// Tokens are folded (upper-cased, accents removed) on insertion and matched
/// as substrings of the folded input. Precedence is fixed by status, not by
/// table order: a text matching both an authorized and a retired token is
/// authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRules {
    rules: Vec<(String, ProductStatus)>,
}

impl StatusRules {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (S, ProductStatus)>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|(token, status)| (fold_for_matching(token.as_ref()), status))
            .filter(|(token, _)| !token.is_empty())
            .collect();
        Self { rules }
    }

    /// Parses `TOKEN=STATUS` pairs separated by commas, e.g.
    /// `AUTORISE=AUTHORIZED,RETIRE=RETIRED`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut rules = Vec::new();
        for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let (token, status) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected TOKEN=STATUS, got '{pair}'"))?;
            let token = token.trim();
            if token.is_empty() {
                return Err(format!("empty token in '{pair}'"));
            }
            rules.push((token.to_string(), status.parse::<ProductStatus>()?));
        }

        if rules.is_empty() {
            return Err("no status tokens configured".to_string());
        }

        Ok(Self::new(rules))
    }

    pub fn classify(&self, raw: &str) -> ProductStatus {
        let folded = fold_for_matching(raw);
        if folded.is_empty() {
            return ProductStatus::Unknown;
        }

        ProductStatus::PRECEDENCE
            .into_iter()
            .find(|status| {
                self.rules
                    .iter()
                    .any(|(token, rule_status)| rule_status == status && folded.contains(token))
            })
            .unwrap_or(ProductStatus::Unknown)
    }
}

impl Default for StatusRules {
    fn default() -> Self {
        Self::new([
            ("AUTORISE", ProductStatus::Authorized),
            ("AUTHORIZED", ProductStatus::Authorized),
            ("RETIRE", ProductStatus::Retired),
            ("RETIRED", ProductStatus::Retired),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_cover_french_and_english_wording() {
        let rules = StatusRules::default();
        assert_eq!(rules.classify("AUTORISE"), ProductStatus::Authorized);
        assert_eq!(rules.classify("Autorisé"), ProductStatus::Authorized);
        assert_eq!(rules.classify("authorized"), ProductStatus::Authorized);
        assert_eq!(rules.classify("Retiré"), ProductStatus::Retired);
        assert_eq!(rules.classify("RETIRED"), ProductStatus::Retired);
    }

    #[test]
    fn empty_and_unrecognized_text_is_unknown() {
        let rules = StatusRules::default();
        assert_eq!(rules.classify(""), ProductStatus::Unknown);
        assert_eq!(rules.classify("   "), ProductStatus::Unknown);
        assert_eq!(rules.classify("en cours d'évaluation"), ProductStatus::Unknown);
    }

    #[test]
    fn authorized_wins_when_both_tokens_match() {
        let rules = StatusRules::default();
        assert_eq!(
            rules.classify("AUTORISE puis RETIRE"),
            ProductStatus::Authorized
        );

        let reversed = StatusRules::new([
            ("RETIRE", ProductStatus::Retired),
            ("AUTORISE", ProductStatus::Authorized),
        ]);
        assert_eq!(
            reversed.classify("RETIRE / AUTORISE"),
            ProductStatus::Authorized
        );
    }

    #[test]
    fn parse_accepts_custom_tables() {
        let rules = StatusRules::parse("valide=AUTHORIZED, abroge=retired").expect("parses");
        assert_eq!(rules.classify("Validé"), ProductStatus::Authorized);
        assert_eq!(rules.classify("Abrogé"), ProductStatus::Retired);
        assert_eq!(rules.classify("AUTORISE"), ProductStatus::Unknown);
    }

    #[test]
    fn parse_rejects_malformed_pairs() {
        assert!(StatusRules::parse("AUTORISE").is_err());
        assert!(StatusRules::parse("=AUTHORIZED").is_err());
        assert!(StatusRules::parse("AUTORISE=MAYBE").is_err());
        assert!(StatusRules::parse(" , ").is_err());
    }
}
