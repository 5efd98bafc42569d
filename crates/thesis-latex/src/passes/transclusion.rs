/*
 * transclusion.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pass that inlines \input and \include targets.
 */

//! Transclusion resolution.
//!
//! Every `\input{...}` / `\include{...}` is replaced by the content of its
//! target, recursively, until no directive is left. Targets are resolved as
//! given first, then relative to the directory of the document being
//! assembled. A stack of the files currently being expanded turns a file
//! that includes itself into a [`TransclusionCycle`] error instead of an
//! endless loop.
//!
//! [`Transclusion::normalizing`] also runs path normalization and label
//! isolation over each inlined file before splicing it, so content pulled in
//! after those passes ran on the host document ends up in the same state.
//!
//! [`TransclusionCycle`]: crate::AssemblyError::TransclusionCycle

use std::path::{Path, PathBuf};

use crate::directives::{DirectiveSpec, try_rewrite, unquote};
use crate::document::SourceDocument;
use crate::error::{AssemblyError, Result};
use crate::options::AssemblyOptions;
use crate::passes::{isolate_labels, normalize_paths};
use crate::pipeline::DocumentPass;

const TRANSCLUSION_DIRECTIVES: DirectiveSpec = DirectiveSpec::new(&["input", "include"], 0);

#[derive(Debug, Clone, Default)]
pub struct Transclusion {
    normalize_inlined: bool,
}

impl Transclusion {
    /// Inline targets verbatim (minus end markers).
    pub fn new() -> Self {
        Self::default()
    }

    /// Inline targets with their paths made absolute and their labels
    /// namespaced by the host document's tag.
    pub fn normalizing() -> Self {
        Self {
            normalize_inlined: true,
        }
    }
}

impl DocumentPass for Transclusion {
    fn name(&self) -> &str {
        "transclusion"
    }

    fn apply(&self, doc: &mut SourceDocument, options: &AssemblyOptions) -> Result<usize> {
        let resolver = Resolver {
            directory: doc.directory().to_path_buf(),
            namespace_tag: self
                .normalize_inlined
                .then(|| doc.namespace_tag().to_string()),
            options,
        };
        let mut stack = vec![canonical_or_given(doc.path())];
        resolver.expand(&mut doc.working_text, &mut stack)
    }
}

struct Resolver<'a> {
    directory: PathBuf,
    /// Set when inlined content is normalized like the host document.
    namespace_tag: Option<String>,
    options: &'a AssemblyOptions,
}

impl Resolver<'_> {
    /// Expand every directive in `text`. `stack` holds the files being
    /// expanded, outermost first. Returns the number of files inlined at any
    /// depth.
    fn expand(&self, text: &mut String, stack: &mut Vec<PathBuf>) -> Result<usize> {
        let mut inlined = 0;
        try_rewrite(text, &TRANSCLUSION_DIRECTIVES, |d, text| {
            let target = unquote(d.argument(text));
            let path = self.locate(target)?;
            let content = self.load(&path, stack, &mut inlined)?;
            inlined += 1;
            Ok::<_, AssemblyError>(Some((d.span(), content)))
        })?;
        Ok(inlined)
    }

    /// Read `path`, strip end markers and expand its own directives.
    fn load(&self, path: &Path, stack: &mut Vec<PathBuf>, inlined: &mut usize) -> Result<String> {
        let canonical = canonical_or_given(path);
        if stack.contains(&canonical) {
            let mut chain = stack.clone();
            chain.push(canonical);
            return Err(AssemblyError::TransclusionCycle { chain });
        }
        if stack.len() > self.options.max_transclusion_depth {
            return Err(AssemblyError::TransclusionDepthExceeded {
                limit: self.options.max_transclusion_depth,
                path: path.to_path_buf(),
            });
        }

        let mut content =
            std::fs::read_to_string(path).map_err(|e| AssemblyError::io("read", path, e))?;
        for marker in &self.options.end_markers {
            content = content.replace(marker.as_str(), "");
        }
        if let Some(tag) = &self.namespace_tag {
            normalize_paths(&mut content, &self.directory);
            if !tag.is_empty() {
                isolate_labels(&mut content, tag);
            }
        }
        tracing::debug!(path = %path.display(), depth = stack.len(), "Inlining file");

        stack.push(canonical);
        let nested = self.expand(&mut content, stack);
        stack.pop();
        *inlined += nested?;

        Ok(content)
    }

    /// Find the file a directive refers to.
    fn locate(&self, target: &str) -> Result<PathBuf> {
        let mut candidate = PathBuf::from(target);
        if candidate.extension().is_none() && !self.options.default_extension.is_empty() {
            candidate = PathBuf::from(format!("{}.{}", target, self.options.default_extension));
        }

        if candidate.is_file() {
            return Ok(candidate);
        }
        let relative = self.directory.join(&candidate);
        if relative.is_file() {
            return Ok(relative);
        }

        Err(AssemblyError::MissingTransclusionTarget {
            target: target.to_string(),
            directory: self.directory.clone(),
        })
    }
}

fn canonical_or_given(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
