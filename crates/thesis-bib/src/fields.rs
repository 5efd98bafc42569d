//! Ordered, case-insensitive field storage for bibliography records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field name → value mapping that preserves insertion order.
///
/// Names are lower-cased on the way in, so `Title` and `title` are the same
/// field. Re-inserting an existing name replaces the value but keeps the
/// original position, which keeps serialized output stable across merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    entries: IndexMap<String, String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value if the name was present.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.entries
            .insert(name.as_ref().to_lowercase(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The value of `name` when present and not blank.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// Remove a field, shifting later fields up so order is kept.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Overlay `other` onto `self`: values from `other` win, names already
    /// present keep their position, new names are appended.
    pub fn overlay(&mut self, other: &FieldMap) {
        for (name, value) in other.iter() {
            self.entries.insert(name.to_string(), value.to_string());
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
