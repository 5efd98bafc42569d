//! Duplicate detection and canonical merging within one collection.

use crate::collection::RecordCollection;
use crate::error::{Error, Result};
use crate::record::BibRecord;
use crate::rename::RenameMap;
use crate::similarity::SimilarityEngine;
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// Keys of records judged to be the same work, in collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub keys: Vec<String>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

pub struct Deduplicator<'a> {
    engine: &'a SimilarityEngine,
}

impl<'a> Deduplicator<'a> {
    pub fn new(engine: &'a SimilarityEngine) -> Self {
        Self { engine }
    }

    /// Partition the collection into groups of mutually equal records.
    ///
    /// Seeds are taken in collection order; every remaining record equal to
    /// the seed joins its group. Groups of one are dropped. O(n²).
    pub fn find_duplicate_groups(&self, collection: &RecordCollection) -> Vec<DuplicateGroup> {
        self.partition(collection, |a, b| self.engine.equals(a, b))
    }

    /// Groups of similar (but not necessarily equal) records for review.
    ///
    /// Groups that exactly repeat an equality group are left out, since
    /// those records are merged automatically anyway.
    pub fn find_similar_groups(&self, collection: &RecordCollection) -> Vec<DuplicateGroup> {
        let equal = self.find_duplicate_groups(collection);
        self.partition(collection, |a, b| self.engine.similar(a, b))
            .into_iter()
            .filter(|group| !equal.contains(group))
            .collect()
    }

    /// Keys whose record equals an earlier record (all but the first member
    /// of every duplicate group).
    pub fn duplicated_keys(&self, collection: &RecordCollection) -> Vec<String> {
        let mut keys: Vec<String> = self
            .find_duplicate_groups(collection)
            .into_iter()
            .flat_map(|group| group.keys.into_iter().skip(1))
            .collect();
        let order: HashMap<&str, usize> =
            collection.keys().enumerate().map(|(i, k)| (k, i)).collect();
        keys.sort_by_key(|k| order.get(k.as_str()).copied().unwrap_or(usize::MAX));
        keys
    }

    /// Fold a group into one record, left to right, and report which keys
    /// disappeared.
    pub fn merge_group(
        &self,
        collection: &RecordCollection,
        group: &DuplicateGroup,
    ) -> Result<(BibRecord, RenameMap)> {
        let mut records = group.keys.iter().map(|key| {
            collection
                .get(key)
                .ok_or_else(|| Error::RecordNotFound { key: key.clone() })
        });

        let first = records.next().ok_or_else(|| Error::RecordNotFound {
            key: "<empty group>".to_string(),
        })??;
        let mut merged = first.clone();
        for record in records {
            merged = merged.merge(record?);
        }

        let renames = group
            .keys
            .iter()
            .filter(|key| **key != merged.id_key)
            .map(|key| (key.clone(), merged.id_key.clone()))
            .collect();

        Ok((merged, renames))
    }

    /// Replace every duplicate group with its canonical record, placed where
    /// the group's first member was. Returns the accumulated rename map.
    pub fn merge_all(&self, collection: &mut RecordCollection) -> Result<RenameMap> {
        let groups = self.find_duplicate_groups(collection);
        if groups.is_empty() {
            return Ok(RenameMap::new());
        }

        let mut renames = RenameMap::new();
        let mut replacement: HashMap<String, Option<BibRecord>> = HashMap::new();

        for group in &groups {
            let (merged, group_renames) = self.merge_group(collection, group)?;
            tracing::debug!(
                keys = ?group.keys,
                merged = %merged.id_key,
                "Merged duplicate records"
            );
            renames.extend(&group_renames);
            let mut members = group.keys.iter();
            if let Some(first) = members.next() {
                replacement.insert(first.clone(), Some(merged));
            }
            for key in members {
                replacement.insert(key.clone(), None);
            }
        }

        let mut records = IndexMap::with_capacity(collection.len());
        for record in collection.records() {
            match replacement.remove(&record.id_key) {
                Some(Some(merged)) => {
                    records.insert(merged.id_key.clone(), merged);
                }
                Some(None) => {}
                None => {
                    records.insert(record.id_key.clone(), record.clone());
                }
            }
        }
        collection.set_records(records);

        Ok(renames)
    }

    fn partition<F>(&self, collection: &RecordCollection, related: F) -> Vec<DuplicateGroup>
    where
        F: Fn(&BibRecord, &BibRecord) -> bool,
    {
        let mut queue: VecDeque<&BibRecord> = collection.records().collect();
        let mut groups = Vec::new();

        while let Some(seed) = queue.pop_front() {
            let mut keys = vec![seed.id_key.clone()];
            queue.retain(|candidate| {
                if related(seed, candidate) {
                    keys.push(candidate.id_key.clone());
                    false
                } else {
                    true
                }
            });
            if keys.len() > 1 {
                groups.push(DuplicateGroup { keys });
            }
        }

        groups
    }
}
