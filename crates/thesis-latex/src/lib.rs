/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * LaTeX document assembly for multi-article theses.
 */

//! Assembling several independently written LaTeX articles into one
//! document.
//!
//! Each article is loaded as a [`SourceDocument`] and run through an
//! [`AssemblyPipeline`] of rewrite passes:
//!
//! 1. **Path normalization**: file references become absolute
//! 2. **Label isolation**: `\label`/`\ref` names get a per-article prefix
//! 3. **Transclusion**: `\input`/`\include` are inlined recursively
//! 4. **Citation keys**: keys are renamed after the bibliographies merged
//! 5. **Citation punctuation**: `word \cite{x}.` becomes `word.\cite{x}`
//!
//! [`extract_sections`] then cuts each article down to its sections so the
//! results can be concatenated into chapters.

pub mod directives;
pub mod document;
pub mod error;
pub mod options;
pub mod passes;
pub mod pipeline;
pub mod sections;

pub use document::SourceDocument;
pub use error::{AssemblyError, Result};
pub use options::AssemblyOptions;
pub use pipeline::{AssemblyPipeline, DocumentPass, PassReport};
pub use sections::extract_sections;
