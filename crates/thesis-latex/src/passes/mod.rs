/*
 * passes/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rewrite passes over a document's working text.
 */

//! Rewrite passes.
//!
//! - [`PathNormalization`] - Makes `\input`/`\include`/`\includegraphics` paths absolute
//! - [`LabelIsolation`] - Namespaces labels and references per document
//! - [`Transclusion`] - Inlines `\input`/`\include` targets recursively
//! - [`CitationKeyRewrite`] - Applies a bibliography rename map to citations
//! - [`CitationPunctuation`] - Moves punctuation before citations
//!
//! These implement [`DocumentPass`](crate::pipeline::DocumentPass) and can be
//! added to an [`AssemblyPipeline`](crate::pipeline::AssemblyPipeline).

mod citations;
mod labels;
mod paths;
mod transclusion;

pub use citations::{CitationKeyRewrite, CitationPunctuation, normalize_punctuation, rewrite_keys};
pub use labels::{LabelIsolation, isolate_label, isolate_labels};
pub use paths::{PathNormalization, normalize_lexically, normalize_paths};
pub use transclusion::Transclusion;
