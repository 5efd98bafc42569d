//! Bibliography records and the field grammar.
//!
//! A record is one `@type{key, name = value, ...}` entry. This module owns the
//! field-level grammar (nested braces, quoted strings, author initials); the
//! entry-level split lives in [`crate::collection`].

use crate::fields::FieldMap;
use serde::{Deserialize, Serialize};

/// Longest all-capitals author token treated as a run of initials.
const MAX_INITIALS: usize = 3;

/// Generational suffixes that look like initials but are not.
const NAME_SUFFIXES: &[&str] = &["II", "III", "IV"];

/// One bibliographic entry (article, book, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibRecord {
    /// Entry type as authored (`article`, `Book`, ...).
    pub kind: String,
    /// Citation key, unique within the owning collection.
    pub id_key: String,
    pub fields: FieldMap,
}

impl BibRecord {
    pub fn new(kind: impl Into<String>, id_key: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            kind: kind.into(),
            id_key: id_key.into(),
            fields,
        }
    }

    /// Build a record from the text following the key line of an entry.
    pub fn from_field_text(kind: &str, id_key: &str, field_text: &str) -> Self {
        Self::new(kind, id_key, parse_fields(field_text))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// A copy of this record under a different key.
    pub fn with_key(&self, id_key: impl Into<String>) -> Self {
        Self {
            kind: self.kind.clone(),
            id_key: id_key.into(),
            fields: self.fields.clone(),
        }
    }

    /// Merge two records describing the same work into a new record.
    ///
    /// The shorter key wins (ties go to `other`). Fields start from `other`'s
    /// and are overlaid with `self`'s, so `self` wins on overlap and `other`
    /// only contributes fields `self` lacks. Neither operand is modified.
    pub fn merge(&self, other: &BibRecord) -> BibRecord {
        let id_key = if self.id_key.len() < other.id_key.len() {
            &self.id_key
        } else {
            &other.id_key
        };

        let mut fields = other.fields.clone();
        fields.overlay(&self.fields);

        BibRecord::new(self.kind.clone(), id_key.clone(), fields)
    }

    /// Serialize as entry text, one field per line, values wrapped in braces.
    pub fn to_text(&self) -> String {
        let mut out = format!("@{}{{{},\n", self.kind, self.id_key);
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| format!("\t{} = {{{}}}", name, value))
            .collect();
        if !lines.is_empty() {
            out.push_str(&lines.join(",\n"));
            out.push('\n');
        }
        out.push('}');
        out
    }
}

impl std::fmt::Display for BibRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Parse the field area of an entry into an ordered field map.
///
/// Fields are `name = value` separated by commas. A value runs to the next
/// comma outside braces and quotes. Text that is not a `name = value` pair is
/// skipped up to the next such comma.
pub fn parse_fields(text: &str) -> FieldMap {
    let bytes = text.as_bytes();
    let mut fields = FieldMap::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && is_name_byte(bytes[pos]) {
            pos += 1;
        }
        let name = &text[name_start..pos];

        let mut eq = pos;
        while eq < bytes.len() && bytes[eq].is_ascii_whitespace() {
            eq += 1;
        }

        if name.is_empty() || eq >= bytes.len() || bytes[eq] != b'=' {
            let skip_to = value_end(bytes, name_start).max(name_start + 1);
            tracing::debug!(
                text = text.get(name_start..skip_to).unwrap_or_default(),
                "Skipping text that is not a field"
            );
            pos = skip_to;
            continue;
        }

        let value_start = eq + 1;
        let end = value_end(bytes, value_start);
        let mut value = clean_value(&text[value_start..end]);
        if name.eq_ignore_ascii_case("author") {
            value = normalize_author(&value);
        }
        fields.insert(name, value);
        pos = end;
    }

    fields
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Index of the comma ending the value that starts at `start`, or the end of
/// the text. Commas inside braces or a top-level quoted string do not count.
fn value_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            b'"' if depth == 0 => in_quotes = !in_quotes,
            b',' if depth == 0 && !in_quotes => return i,
            _ => {}
        }
        i += 1;
    }

    bytes.len()
}

/// Trim, collapse whitespace and strip one layer of enclosing braces/quotes.
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

    match strip_enclosing(&collapsed) {
        Some(inner) => inner.trim().to_string(),
        None => collapsed,
    }
}

/// The inside of `value` if it is exactly wrapped in one `{...}` or `"..."`.
fn strip_enclosing(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let (open, close) = (bytes[0], bytes[bytes.len() - 1]);
    let wrapped = match (open, close) {
        (b'{', b'}') => matching_brace(bytes, 0) == Some(bytes.len() - 1),
        (b'"', b'"') => closing_quote(bytes) == Some(bytes.len() - 1),
        _ => false,
    };

    wrapped.then(|| &value[1..value.len() - 1])
}

/// Index of the brace closing the one opened at `open`.
pub(crate) fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
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

/// Index of the first top-level quote after the opening one at index 0.
fn closing_quote(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'"' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Rewrite compact initials in an author list as dotted initials.
///
/// Standalone tokens made only of capital letters (up to three, optionally
/// dotted or followed by a comma) become `J. M.`-style initials:
/// `Smith, JM and Doe, A` → `Smith, J. M. and Doe, A.`. Braced tokens and
/// the suffixes `II`, `III` and `IV` are left alone.
pub fn normalize_author(value: &str) -> String {
    value
        .split(' ')
        .map(|token| {
            let (core, comma) = match token.strip_suffix(',') {
                Some(core) => (core, ","),
                None => (token, ""),
            };
            let letters: String = core.chars().filter(|c| *c != '.').collect();
            let is_initials = !letters.is_empty()
                && !NAME_SUFFIXES.contains(&core)
                && letters.chars().count() <= MAX_INITIALS
                && letters.chars().all(|c| c.is_alphabetic() && c.is_uppercase());

            if is_initials {
                let dotted: Vec<String> = letters.chars().map(|c| format!("{}.", c)).collect();
                format!("{}{}", dotted.join(" "), comma)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
