/*
 * citations.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Citation key rewriting and citation punctuation.
 */

//! Citation passes.
//!
//! [`CitationKeyRewrite`] applies the rename map produced while merging
//! bibliographies. [`CitationPunctuation`] moves sentence punctuation in
//! front of citations and turns `Ref.~\cite{x}` into `Ref.~\citenum{x}`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thesis_bib::RenameMap;

use crate::Result;
use crate::directives::{DirectiveSpec, is_commented, rewrite};
use crate::document::SourceDocument;
use crate::options::AssemblyOptions;
use crate::pipeline::DocumentPass;

pub(crate) const CITE_DIRECTIVES: DirectiveSpec = DirectiveSpec::new(
    &[
        "cite",
        "citep",
        "citet",
        "citenum",
        "citeauthor",
        "citeyear",
        "citealp",
        "nocite",
        "parencite",
        "textcite",
        "autocite",
        "footcite",
    ],
    2,
);

const PLAIN_CITE: DirectiveSpec = DirectiveSpec::new(&["cite"], 0);

/// `Ref.` / `Refs.` followed by whitespace or ties, at the end of the text
/// before a `\cite`.
static NUMERIC_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bRefs?\.[ \t\r\n~]+$").expect("valid reference regex"));

/// Rewrites old citation keys to their merged keys.
pub struct CitationKeyRewrite {
    renames: RenameMap,
}

impl CitationKeyRewrite {
    pub fn new(renames: RenameMap) -> Self {
        Self { renames }
    }
}

impl DocumentPass for CitationKeyRewrite {
    fn name(&self) -> &str {
        "citation-keys"
    }

    fn apply(&self, doc: &mut SourceDocument, _options: &AssemblyOptions) -> Result<usize> {
        if self.renames.is_empty() {
            return Ok(0);
        }
        let rewrites = rewrite(&mut doc.working_text, &CITE_DIRECTIVES, |d, text| {
            let keys = rewrite_keys(d.argument(text), &self.renames);
            Some((d.span(), d.with_argument(text, &keys)))
        });
        Ok(rewrites)
    }
}

/// Rename every key in a comma-separated key list, keeping the whitespace
/// around each key and dropping keys that repeat after renaming.
pub fn rewrite_keys(list: &str, renames: &RenameMap) -> String {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for entry in list.split(',') {
        let key = entry.trim();
        if key.is_empty() {
            out.push(entry.to_string());
            continue;
        }
        let resolved = renames.resolve(key);
        if !seen.insert(resolved.to_string()) {
            continue;
        }
        let leading = &entry[..entry.len() - entry.trim_start().len()];
        let trailing = &entry[entry.trim_end().len()..];
        out.push(format!("{}{}{}", leading, resolved, trailing));
    }

    out.join(",")
}

/// Moves `.` and `,` in front of citations (`word \cite{x}.` becomes
/// `word.\cite{x}`) and marks numeric references (`Ref.~\cite{x}` becomes
/// `Ref.~\citenum{x}`).
pub struct CitationPunctuation;

impl DocumentPass for CitationPunctuation {
    fn name(&self) -> &str {
        "citation-punctuation"
    }

    fn apply(&self, doc: &mut SourceDocument, _options: &AssemblyOptions) -> Result<usize> {
        Ok(normalize_punctuation(&mut doc.working_text))
    }
}

/// Apply both punctuation rules to `text`, returning the number of changes.
pub fn normalize_punctuation(text: &mut String) -> usize {
    let moved = rewrite(text, &CITE_DIRECTIVES, |d, text| {
        let bytes = text.as_bytes();

        let mut after = d.end;
        while after < bytes.len() && matches!(bytes[after], b' ' | b'\t' | b'\r' | b'\n') {
            after += 1;
        }
        let punctuation = match bytes.get(after) {
            Some(b'.') => '.',
            Some(b',') => ',',
            _ => return None,
        };

        let before = text[..d.start].trim_end_matches([' ', '\t', '\r', '\n', '~']);
        let word_end = before.chars().next_back()?;
        if !(word_end.is_alphanumeric() || matches!(word_end, '}' | ')' | ']')) {
            return None;
        }
        // Pulling the citation up onto a commented line would disable it.
        if is_commented(text, before.len()) {
            return None;
        }

        let citation = &text[d.start..d.end];
        Some((
            before.len()..after + 1,
            format!("{}{}", punctuation, citation),
        ))
    });

    let numeric = rewrite(text, &PLAIN_CITE, |d, text| {
        if !NUMERIC_REFERENCE.is_match(&text[..d.start]) {
            return None;
        }
        let rest = &text[d.start + "\\cite".len()..d.end];
        Some((d.span(), format!("\\citenum{}", rest)))
    });

    moved + numeric
}
