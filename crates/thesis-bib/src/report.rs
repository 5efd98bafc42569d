//! Duplicate and near-duplicate report for human review.

use crate::collection::RecordCollection;
use crate::dedup::{Deduplicator, DuplicateGroup};
use crate::similarity::SimilarityEngine;
use serde::Serialize;
use std::fmt::Write;

/// One reported group with enough context to judge it by eye.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedGroup {
    pub keys: Vec<String>,
    /// `title` of every member (empty when the record has none), in key order.
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// Groups that would be merged automatically.
    pub duplicates: Vec<ReportedGroup>,
    /// Groups that only pass the fuzzy threshold.
    pub near_duplicates: Vec<ReportedGroup>,
}

impl DuplicateReport {
    pub fn build(collection: &RecordCollection, engine: &SimilarityEngine) -> Self {
        let dedup = Deduplicator::new(engine);
        let describe = |groups: Vec<DuplicateGroup>| -> Vec<ReportedGroup> {
            groups
                .into_iter()
                .map(|group| ReportedGroup {
                    titles: group
                        .keys
                        .iter()
                        .map(|key| {
                            collection
                                .get(key)
                                .and_then(|r| r.field("title"))
                                .unwrap_or_default()
                                .to_string()
                        })
                        .collect(),
                    keys: group.keys,
                })
                .collect()
        };

        Self {
            duplicates: describe(dedup.find_duplicate_groups(collection)),
            near_duplicates: describe(dedup.find_similar_groups(collection)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.near_duplicates.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_section(&mut out, "Duplicates", &self.duplicates);
        write_section(&mut out, "Possible duplicates", &self.near_duplicates);
        out
    }
}

fn write_section(out: &mut String, heading: &str, groups: &[ReportedGroup]) {
    let _ = writeln!(out, "{} ({})", heading, groups.len());
    for group in groups {
        let _ = writeln!(out, "  - {}", group.keys.join(", "));
        for (key, title) in group.keys.iter().zip(&group.titles) {
            if !title.is_empty() {
                let _ = writeln!(out, "      {}: {}", key, title);
            }
        }
    }
}
