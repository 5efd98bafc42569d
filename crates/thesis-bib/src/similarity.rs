//! Equality and fuzzy similarity between bibliography records.
//!
//! Two relations are defined:
//!
//! - **equal**: high-confidence "same work" (same key, or same title/DOI/ISBN).
//!   Used for automatic merging.
//! - **similar**: equal, or enough independently matching fields. Used only to
//!   flag pairs for human review.
//!
//! Similarity treats `volume`, `number` and `year` as hard negatives: a
//! mismatch on any of them rules the pair out no matter how many other fields
//! agree.

use crate::record::BibRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// `\"o`, `\'{e}`, `\c c`, ... : accent commands whose argument is kept.
static ACCENT_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\(?:['"^`~=.]|[uvHcdbkrt]\b)\s*"#).expect("valid accent regex"));

/// `\emph`, `\textit`, ... : formatting commands, dropped entirely.
static NAMED_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[A-Za-z]+\s*").expect("valid command regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Matching field count at which two records count as similar.
    pub threshold: usize,
    /// Fields that prove two records are the same work when equal.
    pub identity_fields: Vec<String>,
    /// Fields whose mismatch disqualifies a pair from being similar.
    pub exact_fields: Vec<String>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            identity_fields: vec!["title".into(), "doi".into(), "isbn".into()],
            exact_fields: vec!["volume".into(), "number".into(), "year".into()],
        }
    }
}

/// Outcome of comparing two author lists surname by surname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthorMatch {
    Surnames,
    Different,
    CountMismatch,
}

/// Compares records. Owns a memo of normalized titles, so an engine is
/// meant to live for one merge run on one thread.
#[derive(Debug, Default)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
    title_cache: RefCell<HashMap<String, String>>,
}

impl SimilarityEngine {
    pub fn new(config: SimilarityConfig) -> Self {
        Self {
            config,
            title_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Normalize a title so typesetting differences do not matter.
    ///
    /// `{\"U}ber {D}eep Learning` and `Über deep learning` both become
    /// `uber deep learning`.
    pub fn normalize_title(&self, title: &str) -> String {
        if let Some(cached) = self.title_cache.borrow().get(title) {
            return cached.clone();
        }

        let without_accents = ACCENT_COMMAND.replace_all(title, "");
        let without_commands = NAMED_COMMAND.replace_all(&without_accents, "");
        let folded: String = without_commands
            .nfd()
            .filter(|c| !is_combining_mark(*c) && *c != '{' && *c != '}' && *c != '\\')
            .collect::<String>()
            .to_lowercase();
        let normalized = folded.split_whitespace().collect::<Vec<_>>().join(" ");

        self.title_cache
            .borrow_mut()
            .insert(title.to_string(), normalized.clone());
        normalized
    }

    /// The first identity field on which `a` and `b` agree, if any.
    pub fn matching_identity_field(&self, a: &BibRecord, b: &BibRecord) -> Option<&str> {
        self.config
            .identity_fields
            .iter()
            .find(|field| {
                match (a.fields.get_non_empty(field), b.fields.get_non_empty(field)) {
                    (Some(x), Some(y)) if field.as_str() == "title" => {
                        self.normalize_title(x) == self.normalize_title(y)
                    }
                    (Some(x), Some(y)) => x.trim() == y.trim(),
                    _ => false,
                }
            })
            .map(String::as_str)
    }

    /// High-confidence match: same key, or an identity field agrees.
    pub fn equals(&self, a: &BibRecord, b: &BibRecord) -> bool {
        a.id_key == b.id_key || self.matching_identity_field(a, b).is_some()
    }

    /// Number of agreeing shared fields, or `None` when a hard negative
    /// (an exact field or the author count) rules the pair out.
    pub fn similarity_score(&self, a: &BibRecord, b: &BibRecord) -> Option<usize> {
        let mut points = 0;

        for (name, value_a) in a.fields.iter() {
            if value_a.trim().is_empty() {
                continue;
            }
            let Some(value_b) = b.fields.get_non_empty(name) else {
                continue;
            };
            let (norm_a, norm_b) = (normalize_value(value_a), normalize_value(value_b));

            if self.config.exact_fields.iter().any(|f| f == name) {
                if norm_a != norm_b {
                    return None;
                }
                points += 1;
            } else if name == "author" {
                if norm_a == norm_b {
                    points += 1;
                    continue;
                }
                match compare_authors(&norm_a, &norm_b) {
                    AuthorMatch::Surnames => points += 1,
                    AuthorMatch::Different => {}
                    AuthorMatch::CountMismatch => return None,
                }
            } else if norm_a == norm_b {
                points += 1;
            }
        }

        Some(points)
    }

    /// Lower-confidence match surfaced for review: equal, or at least
    /// `threshold` agreeing fields with no hard negative.
    pub fn similar(&self, a: &BibRecord, b: &BibRecord) -> bool {
        self.equals(a, b)
            || self
                .similarity_score(a, b)
                .is_some_and(|points| points >= self.config.threshold)
    }
}

/// Normalize a field value for similarity: no braces or periods, lower case,
/// `--` as `-`, single spaces.
fn normalize_value(value: &str) -> String {
    let stripped: String = value
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '.'))
        .collect::<String>()
        .to_lowercase()
        .replace("--", "-");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compare_authors(a: &str, b: &str) -> AuthorMatch {
    let authors_a: Vec<&str> = a.split(" and ").collect();
    let authors_b: Vec<&str> = b.split(" and ").collect();
    if authors_a.len() != authors_b.len() {
        return AuthorMatch::CountMismatch;
    }

    let same_surnames = authors_a
        .iter()
        .zip(&authors_b)
        .all(|(x, y)| first_word(x) == first_word(y));

    if same_surnames {
        AuthorMatch::Surnames
    } else {
        AuthorMatch::Different
    }
}

fn first_word(author: &str) -> &str {
    author
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(',')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldMap;

    fn record(key: &str, fields: &[(&str, &str)]) -> BibRecord {
        BibRecord::new("article", key, fields.iter().copied().collect::<FieldMap>())
    }

    #[test]
    fn test_title_normalization() {
        let engine = SimilarityEngine::default();
        assert_eq!(engine.normalize_title("{\\\"U}ber {D}eep Learning"), "uber deep learning");
        assert_eq!(engine.normalize_title("Über  deep\nlearning"), "uber deep learning");
        assert_eq!(engine.normalize_title("Caf\\'{e} \\emph{society}"), "cafe society");
        assert_eq!(engine.normalize_title("Fa\\c{c}ade"), "facade");
    }

    #[test]
    fn test_title_cache_is_filled() {
        let engine = SimilarityEngine::default();
        engine.normalize_title("Deep Learning");
        engine.normalize_title("Deep Learning");
        assert_eq!(engine.title_cache.borrow().len(), 1);
    }

    #[test]
    fn test_equal_by_title_markup_insensitive() {
        let engine = SimilarityEngine::default();
        let a = record("keyA", &[("title", "{Deep} Learning")]);
        let b = record("keyB", &[("title", "deep learning")]);
        assert!(engine.equals(&a, &b));
        assert!(engine.equals(&b, &a));
        assert_eq!(engine.matching_identity_field(&a, &b), Some("title"));
    }

    #[test]
    fn test_equal_by_key_or_doi() {
        let engine = SimilarityEngine::default();
        let a = record("same", &[("title", "One")]);
        let b = record("same", &[("title", "Two")]);
        assert!(engine.equals(&a, &b));

        let c = record("c", &[("doi", "10.1000/ABC")]);
        let d = record("d", &[("doi", "10.1000/ABC")]);
        let e = record("e", &[("doi", "10.1000/abc")]);
        assert!(engine.equals(&c, &d));
        assert!(!engine.equals(&c, &e), "doi comparison is case-sensitive");
    }

    #[test]
    fn test_empty_identity_fields_do_not_match() {
        let engine = SimilarityEngine::default();
        let a = record("a", &[("title", ""), ("isbn", " ")]);
        let b = record("b", &[("title", ""), ("isbn", " ")]);
        assert!(!engine.equals(&a, &b));
    }

    #[test]
    fn test_equality_reflexive() {
        let engine = SimilarityEngine::default();
        let a = record("a", &[]);
        assert!(engine.equals(&a, &a));
        assert!(engine.similar(&a, &a));
    }

    #[test]
    fn test_similar_by_threshold() {
        let engine = SimilarityEngine::default();
        let a = record(
            "a",
            &[("journal", "Nature"), ("pages", "436--444"), ("year", "2015"), ("title", "X")],
        );
        let b = record(
            "b",
            &[("journal", "nature."), ("pages", "436-444"), ("year", "2015"), ("title", "Y")],
        );
        assert_eq!(engine.similarity_score(&a, &b), Some(3));
        assert!(engine.similar(&a, &b));
        assert!(!engine.equals(&a, &b));
    }

    #[test]
    fn test_year_mismatch_disqualifies() {
        let engine = SimilarityEngine::default();
        let a = record("a", &[("journal", "Nature"), ("pages", "1"), ("publisher", "P"), ("year", "2015")]);
        let b = record("b", &[("journal", "Nature"), ("pages", "1"), ("publisher", "P"), ("year", "2016")]);
        assert_eq!(engine.similarity_score(&a, &b), None);
        assert!(!engine.similar(&a, &b));
    }

    #[test]
    fn test_author_surnames_count_one_point() {
        let engine = SimilarityEngine::default();
        let a = record("a", &[("author", "LeCun, Y. and Bengio, Y.")]);
        let b = record("b", &[("author", "LeCun, Yann and Bengio, Yoshua")]);
        assert_eq!(engine.similarity_score(&a, &b), Some(1));

        let c = record("c", &[("author", "LeCun, Y. and Bengio, Y. and Hinton, G.")]);
        assert_eq!(engine.similarity_score(&a, &c), None);

        let d = record("d", &[("author", "Smith, Y. and Bengio, Y.")]);
        assert_eq!(engine.similarity_score(&a, &d), Some(0));
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let engine = SimilarityEngine::default();
        let a = record("a", &[("author", "Doe, J."), ("journal", "J"), ("volume", "3")]);
        let b = record("b", &[("volume", "3"), ("journal", "J"), ("author", "Doe, John")]);
        assert_eq!(engine.similarity_score(&a, &b), engine.similarity_score(&b, &a));
        assert_eq!(engine.similar(&a, &b), engine.similar(&b, &a));
    }
}
