/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A LaTeX source document being assembled.
 */

//! Source documents.
//!
//! A [`SourceDocument`] keeps the text as loaded (`raw_text`) next to the text
//! the rewrite passes work on (`working_text`), so the changes can be shown as
//! a diff or thrown away with [`SourceDocument::reset`].

use crate::directives::{DirectiveSpec, find_all, find_directive};
use crate::error::{AssemblyError, Result};
use indexmap::IndexMap;
use similar::TextDiff;
use std::path::{Path, PathBuf};

const TITLE: DirectiveSpec = DirectiveSpec::new(&["title"], 1);
const USEPACKAGE: DirectiveSpec = DirectiveSpec::new(&["usepackage"], 1);

#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    directory: PathBuf,
    namespace_tag: String,
    raw_text: String,
    pub working_text: String,
    title: String,
    declared_packages: IndexMap<String, String>,
}

impl SourceDocument {
    /// Build a document from text already in memory. `path` only determines
    /// the directory, namespace tag and output name.
    pub fn new(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        let path = path.into();
        let raw_text = raw_text.into();
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            namespace_tag: namespace_tag_for(&path),
            title: extract_title(&raw_text),
            declared_packages: extract_packages(&raw_text),
            working_text: raw_text.clone(),
            raw_text,
            directory,
            path,
        }
    }

    /// Load a document. The path is made absolute so relative directives
    /// resolve the same way wherever the process runs.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute =
            std::path::absolute(path).map_err(|e| AssemblyError::io("resolve", path, e))?;
        let text = std::fs::read_to_string(&absolute)
            .map_err(|e| AssemblyError::io("read", &absolute, e))?;
        tracing::debug!(path = %absolute.display(), "Loaded document");
        Ok(Self::new(absolute, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn namespace_tag(&self) -> &str {
        &self.namespace_tag
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Package name → the `\usepackage` line declaring it.
    pub fn declared_packages(&self) -> &IndexMap<String, String> {
        &self.declared_packages
    }

    pub fn is_modified(&self) -> bool {
        self.raw_text != self.working_text
    }

    /// Discard every rewrite.
    pub fn reset(&mut self) {
        self.working_text = self.raw_text.clone();
    }

    /// Unified diff from the loaded text to the working text; empty when
    /// nothing changed.
    pub fn diff(&self) -> String {
        if !self.is_modified() {
            return String::new();
        }
        let display = self.path.display().to_string();
        let name = display.trim_start_matches('/');
        TextDiff::from_lines(self.raw_text.as_str(), self.working_text.as_str())
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", name), &format!("b/{}", name))
            .to_string()
    }

    /// `dir/name{suffix}.ext` next to the source file.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match self.path.extension() {
            Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, suffix),
        };
        self.directory.join(file_name)
    }

    /// Write the working text to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.working_text).map_err(|e| AssemblyError::io("write", path, e))
    }
}

/// Name of the containing directory with everything but ASCII letters and
/// digits dropped; the file stem if that leaves nothing.
fn namespace_tag_for(path: &Path) -> String {
    let sanitize = |name: &std::ffi::OsStr| -> String {
        name.to_string_lossy()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    };

    path.parent()
        .and_then(Path::file_name)
        .map(sanitize)
        .filter(|tag| !tag.is_empty())
        .or_else(|| path.file_stem().map(sanitize))
        .unwrap_or_default()
}

fn extract_title(text: &str) -> String {
    find_directive(text, 0, &TITLE)
        .map(|d| d.argument(text).trim().to_string())
        .unwrap_or_default()
}

fn extract_packages(text: &str) -> IndexMap<String, String> {
    let mut packages = IndexMap::new();
    for directive in find_all(text, &USEPACKAGE) {
        let line_start = text[..directive.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[directive.end..]
            .find('\n')
            .map_or(text.len(), |i| directive.end + i);
        let line = text[line_start..line_end].trim();

        for name in directive.argument(text).split(',') {
            let name = name.trim();
            if !name.is_empty() {
                packages.insert(name.to_string(), line.to_string());
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "\\documentclass{article}
\\usepackage[utf8]{inputenc}
\\usepackage{amsmath, graphicx}
\\title{Protein {Folding} Dynamics}
\\begin{document}
\\section{Introduction}\\label{sec:intro}
\\end{document}
";

    #[test]
    fn test_metadata_from_text() {
        let doc = SourceDocument::new("/thesis/chapter-A_1/main.tex", ARTICLE);
        assert_eq!(doc.namespace_tag(), "chapterA1");
        assert_eq!(doc.directory(), Path::new("/thesis/chapter-A_1"));
        assert_eq!(doc.title(), "Protein {Folding} Dynamics");

        let packages: Vec<(&str, &str)> = doc
            .declared_packages()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            packages,
            vec![
                ("inputenc", "\\usepackage[utf8]{inputenc}"),
                ("amsmath", "\\usepackage{amsmath, graphicx}"),
                ("graphicx", "\\usepackage{amsmath, graphicx}"),
            ]
        );
    }

    #[test]
    fn test_namespace_tag_falls_back_to_stem() {
        let doc = SourceDocument::new("/__/paper_2.tex", "");
        assert_eq!(doc.namespace_tag(), "paper2");
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_output_path() {
        let doc = SourceDocument::new("/thesis/chapterA/main.tex", "");
        assert_eq!(
            doc.output_path("_combined"),
            PathBuf::from("/thesis/chapterA/main_combined.tex")
        );
    }

    #[test]
    fn test_reset_and_diff() {
        let mut doc = SourceDocument::new("/thesis/chapterA/main.tex", "one\ntwo\nthree\n");
        assert_eq!(doc.diff(), "");

        doc.working_text = "one\n2\nthree\n".to_string();
        assert!(doc.is_modified());
        insta::assert_snapshot!(doc.diff(), @r"
        --- a/thesis/chapterA/main.tex
        +++ b/thesis/chapterA/main.tex
        @@ -1,3 +1,3 @@
         one
        -two
        +2
         three
        ");

        doc.reset();
        assert!(!doc.is_modified());
        assert_eq!(doc.working_text, doc.raw_text());
    }

    #[test]
    fn test_load_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.tex");
        std::fs::write(&source, ARTICLE).unwrap();

        let mut doc = SourceDocument::from_path(&source).unwrap();
        assert!(doc.path().is_absolute());
        doc.working_text.push_str("% assembled\n");

        let out = doc.output_path("_combined");
        doc.write_to(&out).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.ends_with("% assembled\n"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SourceDocument::from_path("/definitely/not/here.tex").unwrap_err();
        assert!(matches!(err, AssemblyError::Io { action: "read", .. }));
        assert_eq!(err.to_diagnostic().code.as_deref(), Some("T-2-4"));
    }
}
