/*
 * sections.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Extraction of the section body of an article.
 */

//! Section extraction.
//!
//! An article becomes a chapter by keeping only what lies between its first
//! real `\section` and `\end{document}`: the preamble, title block and
//! bibliography commands belong to the thesis, not the chapter.

use crate::directives::{DirectiveSpec, find_all, rewrite};

const SECTION: DirectiveSpec = DirectiveSpec::new(&["section"], 1);

const END_DOCUMENT: &str = "\\end{document}";

/// Headings that are never numbered when `force_unnumbered` is set.
const UNNUMBERED_TITLES: &[&str] = &[
    "acknowledgments",
    "acknowledgements",
    "conflict of interest",
    "conflicts of interest",
];

/// Cut `text` down to its sections.
///
/// Starts at the first `\section{..}` / `\section*{..}` with a non-empty
/// title, stops at `\end{document}`, and drops every line containing
/// `\bibliography{` or `\bibliographystyle{`. With `force_unnumbered`,
/// acknowledgement and conflict-of-interest sections become `\section*`.
pub fn extract_sections(text: &str, force_unnumbered: bool) -> String {
    let Some(start) = find_all(text, &SECTION)
        .into_iter()
        .find(|d| !d.argument(text).trim().is_empty())
        .map(|d| d.start)
    else {
        tracing::debug!("No section heading found");
        return String::new();
    };

    let body = &text[start..];
    let body = match body.find(END_DOCUMENT) {
        Some(end) => &body[..end],
        None => body,
    };

    let mut extracted: String = body
        .split_inclusive('\n')
        .filter(|line| !line.contains("\\bibliography{") && !line.contains("\\bibliographystyle{"))
        .collect();

    if force_unnumbered {
        rewrite(&mut extracted, &SECTION, |d, text| {
            let title = d.argument(text);
            let normalized = title.trim().to_lowercase();
            UNNUMBERED_TITLES
                .contains(&normalized.as_str())
                .then(|| (d.span(), format!("\\section*{{{}}}", title)))
        });
    }

    extracted
}
