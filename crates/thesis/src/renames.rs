//! Rename plans handed from `bib merge` to `assemble`.
//!
//! A key collision renames a record only for the documents that cite the
//! bibliography it came from, while deduplication renames apply to every
//! document. The plan keeps the two apart and picks the right map for each
//! document by the directory its bibliography lives in.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thesis_bib::RenameMap;
use thesis_latex::passes::normalize_lexically;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenamePlan {
    /// Renames every document applies.
    pub shared: RenameMap,
    /// Renames for documents next to a bibliography file, keyed by its path.
    pub by_source: IndexMap<String, RenameMap>,
}

impl RenamePlan {
    pub fn new(by_source: IndexMap<String, RenameMap>, shared: RenameMap) -> Self {
        Self {
            shared,
            by_source: by_source
                .into_iter()
                .filter(|(_, renames)| !renames.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.by_source.is_empty()
    }

    /// Number of renames across the plan.
    pub fn len(&self) -> usize {
        self.shared.len() + self.by_source.values().map(RenameMap::len).sum::<usize>()
    }

    /// The renames for a document in `directory`: its bibliography's own
    /// renames first, then the shared ones for keys those leave alone.
    pub fn for_document(&self, directory: &Path) -> RenameMap {
        let directory = normalize_lexically(directory);
        let mut renames = RenameMap::new();
        for (source, map) in &self.by_source {
            let source_dir = Path::new(source).parent().map(normalize_lexically);
            if source_dir.as_deref() == Some(directory.as_path()) {
                renames.extend(map);
            }
        }
        for (old, new) in self.shared.iter() {
            if renames.get(old).is_none() {
                renames.insert(old, new);
            }
        }
        renames
    }

    /// Read a plan, or a flat `{"old": "new"}` map used as the shared part.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rename map: {}", path.display()))?;
        serde_json::from_str::<RenamePlan>(&text)
            .or_else(|_| {
                serde_json::from_str::<RenameMap>(&text).map(|shared| RenamePlan {
                    shared,
                    by_source: IndexMap::new(),
                })
            })
            .with_context(|| format!("Invalid rename map: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write rename map: {}", path.display()))
    }
}

/// Absolute form of a user-supplied path, so bibliography sources and
/// document directories compare equal.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;
    Ok(normalize_lexically(&absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> RenameMap {
        pairs.iter().copied().collect()
    }

    fn plan() -> RenamePlan {
        let mut by_source = IndexMap::new();
        by_source.insert("/thesis/chapterA/references.bib".to_string(), RenameMap::new());
        by_source.insert(
            "/thesis/chapterB/references.bib".to_string(),
            map(&[("shared", "sharedCopy1")]),
        );
        RenamePlan::new(
            by_source,
            map(&[("lecun_deep_2015", "LeCun2015"), ("shared", "S")]),
        )
    }

    #[test]
    fn test_empty_sources_are_dropped() {
        let plan = plan();
        assert_eq!(plan.by_source.len(), 1);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_source_renames_win_over_shared() {
        let plan = plan();

        let b = plan.for_document(Path::new("/thesis/chapterB"));
        assert_eq!(b.resolve("shared"), "sharedCopy1");
        assert_eq!(b.resolve("lecun_deep_2015"), "LeCun2015");

        let a = plan.for_document(Path::new("/thesis/./chapterA"));
        assert_eq!(a.resolve("shared"), "S");
        assert_eq!(a.resolve("sharedCopy1"), "sharedCopy1");
    }

    #[test]
    fn test_file_round_trip_and_flat_maps() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("renames.json");
        plan().write(&path).unwrap();
        assert_eq!(RenamePlan::from_path(&path).unwrap(), plan());

        let flat = dir.path().join("flat.json");
        std::fs::write(&flat, r#"{"a": "b"}"#).unwrap();
        let plan = RenamePlan::from_path(&flat).unwrap();
        assert_eq!(plan.shared.resolve("a"), "b");
        assert!(plan.by_source.is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[1, 2]").unwrap();
        let err = RenamePlan::from_path(&broken).unwrap_err();
        assert!(err.to_string().contains("Invalid rename map"));
    }
}
