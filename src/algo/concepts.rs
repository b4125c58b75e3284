use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Embedded default concept table, compiled from `concepts/default.json`.
/// Users override it with the `$THEMES_CONCEPTS` env var.
const EMBEDDED_DEFAULT: &str = include_str!("../../concepts/default.json");

/// A keyword and the business concepts it votes for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEntry {
    pub keyword: String,
    pub concepts: Vec<String>,
}

/// Ordered keyword → concepts table. Order matters: it breaks score ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptTable {
    pub name: String,
    pub version: String,
    pub entries: Vec<ConceptEntry>,
}

impl ConceptTable {
    /// Concepts for a keyword, if the table has an entry for it.
    pub fn lookup(&self, keyword: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.keyword == keyword)
            .map(|e| e.concepts.as_slice())
    }

    /// Score concepts against salient tokens and return the winner.
    ///
    /// Each token equal to a keyword adds one to each of that keyword's
    /// concepts. Ties go to the concept that was scored first, walking the
    /// tokens in order and each keyword's concepts left to right. `None`
    /// when nothing scored.
    pub fn best_concept<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&str> {
        let mut scores: Vec<(&str, usize)> = Vec::new();
        for token in tokens {
            let Some(concepts) = self.lookup(token.as_ref()) else {
                continue;
            };
            for concept in concepts {
                match scores.iter_mut().find(|(name, _)| *name == concept.as_str()) {
                    Some((_, score)) => *score += 1,
                    None => scores.push((concept.as_str(), 1)),
                }
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (name, score) in scores {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Load the concept table using this resolution order:
///
/// 1. `$THEMES_CONCEPTS` env var (path to JSON file)
/// 2. Embedded compile-time default from `concepts/default.json`
///
/// A broken override is logged and falls through to the default.
pub fn default_concepts() -> ConceptTable {
    if let Ok(path) = std::env::var("THEMES_CONCEPTS") {
        match load_concepts(&path) {
            Ok(table) => return table,
            Err(e) => warn!(error = %e, "ignoring THEMES_CONCEPTS"),
        }
    }
    embedded_concepts()
}

/// The compiled-in table.
pub fn embedded_concepts() -> ConceptTable {
    parse_concepts(EMBEDDED_DEFAULT).expect("embedded default concept table is invalid JSON")
}

/// Parse a concept table from a JSON string.
pub fn parse_concepts(json: &str) -> Result<ConceptTable, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load a concept table from a file path.
pub fn load_concepts(path: &str) -> Result<ConceptTable, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_concepts(&json).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> ConceptTable {
        parse_concepts(json).unwrap()
    }

    #[test]
    fn embedded_table_has_22_entries() {
        let t = embedded_concepts();
        assert_eq!(t.entries.len(), 22);
        assert_eq!(t.entries[0].keyword, "customer");
        assert_eq!(t.entries[21].keyword, "program");
        assert!(t.entries.iter().all(|e| e.concepts.len() == 3));
    }

    #[test]
    fn lookup_finds_keywords() {
        let t = embedded_concepts();
        assert_eq!(
            t.lookup("staff").unwrap()[0],
            "Staff & Operations".to_string()
        );
        assert!(t.lookup("wine").is_none());
    }

    #[test]
    fn highest_score_wins() {
        let t = embedded_concepts();
        let best = t.best_concept(&["menu", "seasonal", "customer"]);
        assert_eq!(best, Some("Menu & Food"));
    }

    #[test]
    fn ties_go_to_first_scored_concept() {
        let t = table(
            r#"{"name": "t", "version": "1", "entries": [
                {"keyword": "alpha", "concepts": ["First", "Shared"]},
                {"keyword": "beta", "concepts": ["Second", "Shared"]}
            ]}"#,
        );
        // Shared = 2 beats both singles
        assert_eq!(t.best_concept(&["alpha", "beta"]), Some("Shared"));
        // Second and Shared tie at 1; Second is scored first
        assert_eq!(t.best_concept(&["beta"]), Some("Second"));
        assert_eq!(t.best_concept(&["alpha"]), Some("First"));
    }

    #[test]
    fn matched_keyword_leads_its_own_ties() {
        let t = embedded_concepts();
        assert_eq!(t.best_concept(&["event"]), Some("Events & Entertainment"));
        assert_eq!(t.best_concept(&["program"]), Some("Programs & Systems"));
    }

    #[test]
    fn tie_break_follows_token_order() {
        let t = embedded_concepts();
        assert_eq!(
            t.best_concept(&["staff", "customer"]),
            Some("Staff & Operations")
        );
        assert_eq!(
            t.best_concept(&["customer", "staff"]),
            Some("Customer Experience")
        );
    }

    #[test]
    fn nothing_scored() {
        let t = embedded_concepts();
        assert_eq!(t.best_concept(&["wine", "pairing"]), None);
        assert_eq!(t.best_concept::<&str>(&[]), None);
    }

    #[test]
    fn embedded_json_roundtrips() {
        let t = embedded_concepts();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(parse_concepts(&json).unwrap(), t);
    }

    #[test]
    fn missing_override_file_is_error() {
        assert!(load_concepts("/nonexistent/concepts.json").is_err());
    }
}
