//! Old-key → new-key mappings produced by merging and deduplication.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mapping from a citation key that no longer exists to the key that
/// replaced it. Many old keys may map to one new key; keys not in the map are
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMap {
    entries: IndexMap<String, String>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old → new`. Identity renames are ignored.
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let (old, new) = (old.into(), new.into());
        if old != new {
            self.entries.insert(old, new);
        }
    }

    /// The direct replacement for `key`, if it was renamed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The final key for `key`, following chains (`a → b`, `b → c` gives `c`).
    /// Stops if a chain loops back on itself.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        let mut current = key;
        for _ in 0..=self.entries.len() {
            match self.get(current) {
                Some(next) if next != key => current = next,
                _ => break,
            }
        }
        current
    }

    /// Add every entry of `other`; entries in `other` win.
    pub fn extend(&mut self, other: &RenameMap) {
        for (old, new) in other.iter() {
            self.insert(old, new);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a rename map written by [`RenameMap::write_json`].
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| Error::Io {
            action: "read",
            path: path.to_path_buf(),
            error,
        })?;
        serde_json::from_str(&text).map_err(|error| Error::Io {
            action: "parse",
            path: path.to_path_buf(),
            error: std::io::Error::new(std::io::ErrorKind::InvalidData, error),
        })
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(path, text + "\n").map_err(|error| Error::Io {
            action: "write",
            path: path.to_path_buf(),
            error,
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenameMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RenameMap::new();
        for (old, new) in iter {
            map.insert(old, new);
        }
        map
    }
}
