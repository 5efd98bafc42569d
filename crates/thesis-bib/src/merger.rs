//! Combining bibliography collections from independently authored documents.

use crate::collection::RecordCollection;
use crate::rename::RenameMap;
use crate::similarity::SimilarityEngine;
use indexmap::IndexMap;
use thesis_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};

/// Result of combining collections.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub collection: RecordCollection,
    /// Renames produced by key collisions, flattened over every right-hand
    /// collection. A key renamed in two collections keeps the later rename.
    pub renames: RenameMap,
    /// The same renames, per collection whose citations they apply to
    /// (keyed by its display name).
    pub renames_by_source: IndexMap<String, RenameMap>,
    /// Key collisions (warnings) and merged records (info), in the order
    /// they were encountered.
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl MergeOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
    }
}

pub struct DatabaseMerger<'a> {
    engine: &'a SimilarityEngine,
}

impl<'a> DatabaseMerger<'a> {
    pub fn new(engine: &'a SimilarityEngine) -> Self {
        Self { engine }
    }

    /// Combine `right` into `left`.
    ///
    /// Records of `right` whose key is free are appended. A taken key holding
    /// the same work (an identity field agrees) is merged in place with the
    /// incoming record as `self`. A taken key holding a different work keeps
    /// both: the incoming record moves to `{key}Copy{n}`.
    pub fn combine(&self, left: RecordCollection, right: RecordCollection) -> MergeOutcome {
        let left_name = left.display_name();
        let right_name = right.display_name();
        let source = left.source().map(|p| p.to_path_buf());

        let (mut records, mut preamble) = left.into_parts();
        let (incoming, right_preamble) = right.into_parts();
        preamble.extend(right_preamble);

        let mut renames = RenameMap::new();
        let mut diagnostics = Vec::new();

        for (key, record) in incoming.iter() {
            let Some(existing) = records.get(key) else {
                records.insert(key.clone(), record.clone());
                continue;
            };

            if let Some(field) = self.engine.matching_identity_field(record, existing) {
                let merged = record.merge(existing);
                tracing::debug!(key = %key, field, "Merging records with the same key");
                diagnostics.push(merged_diagnostic(key, field, &left_name, &right_name));
                if merged.id_key != *key {
                    records.shift_remove(key);
                }
                records.insert(merged.id_key.clone(), merged);
            } else {
                let new_key = free_copy_key(key, |candidate| {
                    records.contains_key(candidate) || incoming.contains_key(candidate)
                });
                tracing::warn!(
                    key = %key,
                    new_key = %new_key,
                    left = %left_name,
                    right = %right_name,
                    "Key collision between different records"
                );
                diagnostics.push(collision_diagnostic(key, &new_key, &left_name, &right_name));
                renames.insert(key.clone(), new_key.clone());
                records.insert(new_key.clone(), record.with_key(new_key));
            }
        }

        let mut renames_by_source = IndexMap::new();
        if !renames.is_empty() {
            renames_by_source.insert(right_name, renames.clone());
        }

        MergeOutcome {
            collection: RecordCollection::from_parts(records, preamble, source),
            renames,
            renames_by_source,
            diagnostics,
        }
    }

    /// Fold [`combine`](Self::combine) over `collections`, starting from the
    /// empty collection.
    pub fn combine_all<I>(&self, collections: I) -> MergeOutcome
    where
        I: IntoIterator<Item = RecordCollection>,
    {
        collections
            .into_iter()
            .fold(MergeOutcome::default(), |acc, next| {
                let step = self.combine(acc.collection, next);
                let mut renames = acc.renames;
                renames.extend(&step.renames);
                let mut renames_by_source = acc.renames_by_source;
                for (source, map) in step.renames_by_source {
                    renames_by_source.entry(source).or_default().extend(&map);
                }
                let mut diagnostics = acc.diagnostics;
                diagnostics.extend(step.diagnostics);
                MergeOutcome {
                    collection: step.collection,
                    renames,
                    renames_by_source,
                    diagnostics,
                }
            })
    }
}

/// `{key}Copy{n}` for the smallest `n >= 1` that is not taken.
fn free_copy_key(key: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{}Copy{}", key, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| format!("{}Copy", key))
}

fn collision_diagnostic(key: &str, new_key: &str, left: &str, right: &str) -> DiagnosticMessage {
    DiagnosticMessageBuilder::warning("Conflicting Duplicate Key")
        .with_code("T-1-3")
        .problem(format!(
            "Key `{}` names different records in {} and {}",
            key, left, right
        ))
        .add_info(format!("The record from {} was kept as `{}`", left, key))
        .add_info(format!("The record from {} was renamed to `{}`", right, new_key))
        .add_hint("Check both records by hand; citations from the second file are rewritten")
        .build()
}

fn merged_diagnostic(key: &str, field: &str, left: &str, right: &str) -> DiagnosticMessage {
    DiagnosticMessageBuilder::info("Duplicate Key Merged")
        .with_code("T-1-4")
        .problem(format!(
            "Key `{}` appears in {} and {} with the same {}",
            key, left, right, field
        ))
        .add_note("Fields of both records were combined")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> RecordCollection {
        RecordCollection::parse(raw).unwrap()
    }

    #[test]
    fn test_disjoint_collections_append() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine(
            parse("@misc{a,\n title = {A}\n}\n"),
            parse("@misc{b,\n title = {B}\n}\n"),
        );
        let keys: Vec<&str> = outcome.collection.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(outcome.renames.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_key_collision_creates_copy() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine(
            parse("@article{shared,\n title = {First Work},\n doi = {10.1/one}\n}\n"),
            parse("@article{shared,\n title = {Second Work},\n doi = {10.1/two}\n}\n"),
        );

        let keys: Vec<&str> = outcome.collection.keys().collect();
        assert_eq!(keys, vec!["shared", "sharedCopy1"]);
        assert_eq!(
            outcome.collection.get("shared").unwrap().field("title"),
            Some("First Work")
        );
        assert_eq!(
            outcome.collection.get("sharedCopy1").unwrap().field("title"),
            Some("Second Work")
        );
        assert_eq!(outcome.renames.get("shared"), Some("sharedCopy1"));

        assert_eq!(outcome.diagnostics.len(), 1);
        let warning = &outcome.diagnostics[0];
        assert_eq!(warning.kind, DiagnosticKind::Warning);
        assert_eq!(warning.code.as_deref(), Some("T-1-3"));
        assert!(warning.to_text().contains("sharedCopy1"));
    }

    #[test]
    fn test_copy_suffix_skips_taken_keys() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine(
            parse("@misc{k,\n title = {One}\n}\n@misc{kCopy1,\n title = {Other}\n}\n"),
            parse("@misc{k,\n title = {Two}\n}\n"),
        );
        assert!(outcome.collection.contains_key("kCopy2"));
        assert_eq!(outcome.renames.get("k"), Some("kCopy2"));
    }

    #[test]
    fn test_same_work_under_same_key_merges() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine(
            parse("@article{dl,\n title = {Deep Learning},\n journal = {Nature}\n}\n"),
            parse("@article{dl,\n title = {{Deep} learning},\n year = {2015}\n}\n"),
        );

        assert_eq!(outcome.collection.len(), 1);
        let record = outcome.collection.get("dl").unwrap();
        assert_eq!(record.field("title"), Some("{Deep} learning"));
        assert_eq!(record.field("journal"), Some("Nature"));
        assert_eq!(record.field("year"), Some("2015"));
        assert!(outcome.renames.is_empty());
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::Info);
        assert_eq!(outcome.diagnostics[0].code.as_deref(), Some("T-1-4"));
        assert_eq!(outcome.warnings().count(), 0);
    }

    #[test]
    fn test_empty_is_identity() {
        let engine = SimilarityEngine::default();
        let merger = DatabaseMerger::new(&engine);
        let original = parse("@comment{x}\n@misc{a,\n title = {A},\n year = {2001}\n}\n");

        let right = merger.combine(original.clone(), RecordCollection::new());
        assert_eq!(right.collection, original);

        let left = merger.combine(RecordCollection::new(), original.clone());
        assert_eq!(left.collection, original);
    }

    #[test]
    fn test_preambles_concatenate_in_order() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine(
            parse("@comment{left}\n@misc{a,\n title = {A}\n}\n"),
            parse("@comment{right}\n@misc{b,\n title = {B}\n}\n"),
        );
        assert_eq!(
            outcome.collection.preamble(),
            &["@comment{left}\n".to_string(), "@comment{right}\n".to_string()]
        );
    }

    #[test]
    fn test_combine_all_folds_from_empty() {
        let engine = SimilarityEngine::default();
        let outcome = DatabaseMerger::new(&engine).combine_all(vec![
            parse("@misc{k,\n title = {One}\n}\n"),
            parse("@misc{k,\n title = {Two}\n}\n"),
            parse("@misc{k,\n title = {Three}\n}\n"),
        ]);
        let keys: Vec<&str> = outcome.collection.keys().collect();
        assert_eq!(keys, vec!["k", "kCopy1", "kCopy2"]);
        assert_eq!(outcome.warnings().count(), 2);
        assert_eq!(outcome.renames.get("k"), Some("kCopy2"));
        assert_eq!(outcome.renames_by_source.len(), 1);
        assert_eq!(
            outcome.renames_by_source["<memory>"].get("k"),
            Some("kCopy2")
        );
    }
}
