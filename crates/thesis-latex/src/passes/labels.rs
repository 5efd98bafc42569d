/*
 * labels.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pass that gives every label a per-document namespace.
 */

use crate::Result;
use crate::directives::{DirectiveSpec, rewrite};
use crate::document::SourceDocument;
use crate::options::AssemblyOptions;
use crate::pipeline::DocumentPass;

const LABEL_DIRECTIVES: DirectiveSpec = DirectiveSpec::new(
    &[
        "label", "ref", "eqref", "pageref", "autoref", "nameref", "cref", "Cref", "vref",
    ],
    1,
);

/// Prefixes the last colon segment of every label with the document's
/// namespace tag, so `\label{sec:intro}` in two articles stays two labels
/// after concatenation.
pub struct LabelIsolation;

impl DocumentPass for LabelIsolation {
    fn name(&self) -> &str {
        "label-isolation"
    }

    fn apply(&self, doc: &mut SourceDocument, _options: &AssemblyOptions) -> Result<usize> {
        let tag = doc.namespace_tag().to_string();
        if tag.is_empty() {
            tracing::warn!(path = %doc.path().display(), "No namespace tag; labels left as they are");
            return Ok(0);
        }

        Ok(isolate_labels(&mut doc.working_text, &tag))
    }
}

/// Namespace every label in `text` with `tag`. Returns the number of
/// directives changed.
pub fn isolate_labels(text: &mut String, tag: &str) -> usize {
    rewrite(text, &LABEL_DIRECTIVES, |d, text| {
        let labels: Vec<String> = d
            .argument(text)
            .split(',')
            .map(|label| isolate_label(label, tag))
            .collect();
        Some((d.span(), d.with_argument(text, &labels.join(","))))
    })
}

/// `sec:intro` with tag `chapterA` becomes `sec:chapterA_intro`. Surrounding
/// whitespace is kept; a segment that already carries the prefix is left
/// alone.
pub fn isolate_label(label: &str, tag: &str) -> String {
    let core = label.trim();
    if core.is_empty() {
        return label.to_string();
    }
    let leading = &label[..label.len() - label.trim_start().len()];
    let trailing = &label[label.trim_end().len()..];

    let (namespace, segment) = match core.rsplit_once(':') {
        Some((namespace, segment)) => (Some(namespace), segment),
        None => (None, core),
    };

    let prefix = format!("{}_", tag);
    let segment = if segment.starts_with(&prefix) {
        segment.to_string()
    } else {
        format!("{}{}", prefix, segment)
    };

    match namespace {
        Some(namespace) => format!("{}{}:{}{}", leading, namespace, segment, trailing),
        None => format!("{}{}{}", leading, segment, trailing),
    }
}
