use crate::catalog::split_secondary_names;
use regex::Regex;
use std::sync::OnceLock;

static SECONDARY_NAMES_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Pieces this short are navigation noise, not product names.
const MIN_NAME_CHARS: usize = 3;

fn pattern() -> &'static Regex {
    SECONDARY_NAMES_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)seconds?\s+noms?\s+commerci(?:al|aux)\s*:\s*([^<\n]+)")
            .expect("secondary names pattern compiles")
    })
}

/// Secondary names listed on a product page ("seconds noms commerciaux :
/// A , B"). A page without that label yields nothing.
pub fn extract_secondary_names(html: &str) -> Vec<String> {
    let Some(captures) = pattern().captures(html) else {
        return Vec::new();
    };

    split_secondary_names(&captures[1], ',')
        .into_iter()
        .filter(|name| name.chars().count() >= MIN_NAME_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_comma_separated_names() {
        let html = "<div><b>Seconds noms commerciaux :</b> FOO , BAR BAZ ,QUX</div>";
        // The label is followed by a tag, so nothing is captured after the colon.
        assert!(extract_secondary_names(html).is_empty());

        let html = "<p>Seconds noms commerciaux : FOO , BAR BAZ ,QUX</p>";
        assert_eq!(extract_secondary_names(html), vec!["FOO", "BAR BAZ", "QUX"]);
    }

    #[test]
    fn accepts_singular_and_case_variants() {
        let html = "second nom commercial: ALPHA\nnext line";
        assert_eq!(extract_secondary_names(html), vec!["ALPHA"]);

        let html = "SECONDS NOMS COMMERCIAUX : BETA, GAMMA<br/>";
        assert_eq!(extract_secondary_names(html), vec!["BETA", "GAMMA"]);
    }

    #[test]
    fn drops_short_pieces() {
        let html = "<p>seconds noms commerciaux : AB, X ,  , LONGER</p>";
        assert_eq!(extract_secondary_names(html), vec!["LONGER"]);
    }

    #[test]
    fn missing_label_means_no_names() {
        assert!(extract_secondary_names("<html><body>Nom produit : FOO</body></html>").is_empty());
        assert!(extract_secondary_names("").is_empty());
    }
}
