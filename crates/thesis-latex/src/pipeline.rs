/*
 * pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Document pass pipeline infrastructure.
 */

//! Document pass pipeline.
//!
//! - [`DocumentPass`] - The trait implemented by every rewrite pass
//! - [`AssemblyPipeline`] - Ordered collection of passes to run on a document
//!
//! Passes run in insertion order over [`SourceDocument::working_text`]. The
//! standard order is path normalization, label isolation, transclusion,
//! citation key rewrite, citation punctuation: paths must be absolute
//! before transclusion moves text between directories, and labels are
//! namespaced by the document that wrote them. The standard transclusion
//! pass applies the first two passes to every file it inlines.
//!
//! # Example
//!
//! ```no_run
//! use thesis_bib::RenameMap;
//! use thesis_latex::{AssemblyOptions, AssemblyPipeline, SourceDocument};
//!
//! let mut doc = SourceDocument::from_path("chapterA/main.tex")?;
//! let pipeline = AssemblyPipeline::standard(RenameMap::new());
//! let report = pipeline.execute(&mut doc, &AssemblyOptions::default())?;
//! println!("{} rewrites", report.total());
//! # Ok::<(), thesis_latex::AssemblyError>(())
//! ```

use crate::Result;
use crate::document::SourceDocument;
use crate::options::AssemblyOptions;
use crate::passes::{
    CitationKeyRewrite, CitationPunctuation, LabelIsolation, PathNormalization, Transclusion,
};
use thesis_bib::RenameMap;

/// Trait for document rewrite passes.
///
/// Passes must be `Send + Sync` so one pipeline can serve several documents.
pub trait DocumentPass: Send + Sync {
    /// Human-readable name for this pass.
    ///
    /// Used for logging and in [`PassReport`].
    fn name(&self) -> &str;

    /// Rewrite the document's working text, returning how many rewrites
    /// changed it.
    fn apply(&self, doc: &mut SourceDocument, options: &AssemblyOptions) -> Result<usize>;
}

/// Rewrite counts per pass from one [`AssemblyPipeline::execute`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub counts: Vec<(String, usize)>,
}

impl PassReport {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn count(&self, pass: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == pass)
            .map(|(_, n)| *n)
    }
}

/// A pipeline of document passes to execute in order.
pub struct AssemblyPipeline {
    passes: Vec<Box<dyn DocumentPass>>,
}

impl AssemblyPipeline {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Every pass in the standard order, rewriting citations with `renames`.
    pub fn standard(renames: RenameMap) -> Self {
        let mut pipeline = Self::new();
        pipeline.extend([
            Box::new(PathNormalization) as Box<dyn DocumentPass>,
            Box::new(LabelIsolation),
            Box::new(Transclusion::normalizing()),
            Box::new(CitationKeyRewrite::new(renames)),
            Box::new(CitationPunctuation),
        ]);
        pipeline
    }

    pub fn push(&mut self, pass: Box<dyn DocumentPass>) {
        self.passes.push(pass);
    }

    pub fn extend(&mut self, passes: impl IntoIterator<Item = Box<dyn DocumentPass>>) {
        self.passes.extend(passes);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Execute all passes in insertion order.
    ///
    /// Returns the first error encountered; the working text then holds the
    /// output of the passes that completed.
    pub fn execute(&self, doc: &mut SourceDocument, options: &AssemblyOptions) -> Result<PassReport> {
        let mut report = PassReport::default();
        for pass in &self.passes {
            tracing::debug!(pass = pass.name(), path = %doc.path().display(), "Running pass");
            let rewrites = pass.apply(doc, options)?;
            report.counts.push((pass.name().to_string(), rewrites));
        }
        Ok(report)
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for AssemblyPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPass {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    impl DocumentPass for CountingPass {
        fn name(&self) -> &str {
            self.name
        }

        fn apply(&self, doc: &mut SourceDocument, _options: &AssemblyOptions) -> Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(self.name);
            doc.working_text.push_str(self.name);
            Ok(1)
        }
    }

    #[test]
    fn test_standard_order() {
        let pipeline = AssemblyPipeline::standard(RenameMap::new());
        assert_eq!(
            pipeline.pass_names(),
            vec![
                "path-normalization",
                "label-isolation",
                "transclusion",
                "citation-keys",
                "citation-punctuation"
            ]
        );
    }

    #[test]
    fn test_passes_run_in_insertion_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = AssemblyPipeline::new();
        for name in ["first", "second", "third"] {
            pipeline.push(Box::new(CountingPass {
                name,
                calls: calls.clone(),
                order: order.clone(),
            }));
        }

        let mut doc = SourceDocument::new("/t/a/main.tex", "");
        let report = pipeline
            .execute(&mut doc, &AssemblyOptions::default())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(doc.working_text, "firstsecondthird");
        assert_eq!(report.total(), 3);
        assert_eq!(report.count("second"), Some(1));
        assert_eq!(report.count("missing"), None);
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = AssemblyPipeline::default();
        assert!(pipeline.is_empty());
        let mut doc = SourceDocument::new("/t/a/main.tex", "x");
        let report = pipeline
            .execute(&mut doc, &AssemblyOptions::default())
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(!doc.is_modified());
    }
}
