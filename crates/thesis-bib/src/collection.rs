//! Record collections: one bibliography file's worth of entries.
//!
//! Parsing splits raw text at entry boundaries (`@word{`, whitespace allowed
//! before the brace), keeps control blocks such as `@comment{...}` verbatim,
//! and turns every other entry into a [`BibRecord`].

use crate::error::{Error, Result};
use crate::record::BibRecord;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static ENTRY_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w+\s*\{").expect("valid entry boundary regex"));

static ENTRY_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s*\{").expect("valid entry head regex"));

/// Options controlling how raw bibliography text is split into records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Entry types kept verbatim in the preamble instead of being parsed
    /// (compared case-insensitively).
    pub control_markers: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            control_markers: ["comment", "control", "preamble", "string"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ParseOptions {
    fn is_control(&self, kind: &str) -> bool {
        self.control_markers
            .iter()
            .any(|marker| marker.eq_ignore_ascii_case(kind))
    }
}

/// An ordered set of records keyed by `id_key`, plus the non-entry text of
/// the file they came from.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    records: IndexMap<String, BibRecord>,
    preamble: Vec<String>,
    source: Option<PathBuf>,
}

impl PartialEq for RecordCollection {
    /// Collections are equal when they hold the same records in the same
    /// order and the same preamble; where they were loaded from is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.preamble == other.preamble
            && self.records.len() == other.records.len()
            && self.records.iter().eq(other.records.iter())
    }
}

impl RecordCollection {
    /// The empty collection, identity element of
    /// [`DatabaseMerger::combine`](crate::DatabaseMerger::combine).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with(raw, &ParseOptions::default())
    }

    pub fn parse_with(raw: &str, options: &ParseOptions) -> Result<Self> {
        parse_source(raw, options, None)
    }

    /// Load and parse a bibliography file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with(path, &ParseOptions::default())
    }

    pub fn from_path_with(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| Error::Io {
            action: "read",
            path: path.to_path_buf(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "Parsing bibliography");
        parse_source(&raw, options, Some(path))
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Human-readable name for messages: the source path or `<memory>`.
    pub fn display_name(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&BibRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &BibRecord> {
        self.records.values()
    }

    /// Insert a record under its own key, replacing any record with that key
    /// in place.
    pub fn insert(&mut self, record: BibRecord) -> Option<BibRecord> {
        self.records.insert(record.id_key.clone(), record)
    }

    /// Remove a record, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<BibRecord> {
        self.records.shift_remove(key)
    }

    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }

    pub fn push_preamble(&mut self, block: impl Into<String>) {
        self.preamble.push(block.into());
    }

    pub(crate) fn set_records(&mut self, records: IndexMap<String, BibRecord>) {
        self.records = records;
    }

    pub(crate) fn from_parts(
        records: IndexMap<String, BibRecord>,
        preamble: Vec<String>,
        source: Option<PathBuf>,
    ) -> Self {
        Self {
            records,
            preamble,
            source,
        }
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, BibRecord>, Vec<String>) {
        (self.records, self.preamble)
    }

    /// Serialize the collection: preamble blocks verbatim, then every record
    /// separated by a blank line.
    pub fn to_text(&self) -> String {
        let mut out = self.preamble.concat();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        let entries: Vec<String> = self.records.values().map(BibRecord::to_text).collect();
        out.push_str(&entries.join("\n\n"));
        if !entries.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Write the serialized collection to `path`, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text()).map_err(|error| Error::Io {
            action: "write",
            path: path.to_path_buf(),
            error,
        })
    }
}

fn parse_source(raw: &str, options: &ParseOptions, source: Option<&Path>) -> Result<RecordCollection> {
    let mut collection = RecordCollection {
        source: source.map(Path::to_path_buf),
        ..RecordCollection::default()
    };

    let starts: Vec<usize> = ENTRY_BOUNDARY.find_iter(raw).map(|m| m.start()).collect();

    let leading = &raw[..starts.first().copied().unwrap_or(raw.len())];
    if !leading.trim().is_empty() {
        collection.preamble.push(leading.to_string());
    }

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(raw.len());
        let segment = &raw[start + 1..end];
        if segment.trim().is_empty() {
            continue;
        }
        parse_entry(segment, options, source, &mut collection)?;
    }

    Ok(collection)
}

fn parse_entry(
    segment: &str,
    options: &ParseOptions,
    source: Option<&Path>,
    collection: &mut RecordCollection,
) -> Result<()> {
    let caps = ENTRY_HEAD
        .captures(segment)
        .ok_or_else(|| Error::malformed(segment, source))?;
    let kind = &caps[1];

    if options.is_control(kind) {
        collection.preamble.push(format!("@{}", segment));
        return Ok(());
    }

    let open = caps.get(0).map_or(0, |m| m.end());
    let close = closing_brace(segment, open)
        .or_else(|| segment.rfind('}').filter(|&close| close >= open))
        .ok_or_else(|| Error::malformed(segment, source))?;
    let body = &segment[open..close];

    // Comments between entries survive as preamble text.
    let trailing = segment[close + 1..].trim_start();
    if !trailing.is_empty() {
        let mut block = trailing.to_string();
        if !block.ends_with('\n') {
            block.push('\n');
        }
        collection.preamble.push(block);
    }

    let (key_line, field_text) = match body.find(['\n', ',']) {
        Some(split) => (&body[..split], &body[split + 1..]),
        None => (body, ""),
    };
    let key = key_line.trim().trim_end_matches(',').trim();
    if key.is_empty() {
        return Err(Error::malformed(segment, source));
    }

    let record = BibRecord::from_field_text(kind, key, field_text);
    if let Some(previous) = collection.insert(record) {
        tracing::warn!(
            key = %previous.id_key,
            source = ?source,
            "Key defined twice in one bibliography; keeping the later entry"
        );
    }
    Ok(())
}

/// Byte offset of the `}` closing an entry whose body starts at `open`.
fn closing_brace(segment: &str, open: usize) -> Option<usize> {
    let bytes = segment.as_bytes();
    let mut depth = 1usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
