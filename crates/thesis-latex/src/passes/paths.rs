/*
 * paths.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pass that makes file references absolute.
 */

use std::path::{Component, Path, PathBuf};

use crate::Result;
use crate::directives::{DirectiveSpec, rewrite, unquote};
use crate::document::SourceDocument;
use crate::options::AssemblyOptions;
use crate::pipeline::DocumentPass;

const FILE_DIRECTIVES: DirectiveSpec =
    DirectiveSpec::new(&["input", "include", "includegraphics"], 1);

/// Rewrites the path argument of `\input`, `\include` and `\includegraphics`
/// as a quoted absolute path rooted at the document directory.
///
/// Once documents from different directories are concatenated, relative
/// paths no longer resolve against the right directory.
pub struct PathNormalization;

impl DocumentPass for PathNormalization {
    fn name(&self) -> &str {
        "path-normalization"
    }

    fn apply(&self, doc: &mut SourceDocument, _options: &AssemblyOptions) -> Result<usize> {
        let directory = doc.directory().to_path_buf();
        Ok(normalize_paths(&mut doc.working_text, &directory))
    }
}

/// Rewrite every file reference in `text` as a quoted absolute path rooted
/// at `directory`. Returns the number of references changed.
pub fn normalize_paths(text: &mut String, directory: &Path) -> usize {
    rewrite(text, &FILE_DIRECTIVES, |d, text| {
        let target = unquote(d.argument(text));
        if target.is_empty() {
            return None;
        }
        let absolute = normalize_lexically(&directory.join(target));
        let quoted = format!("\"{}\"", absolute.display());
        Some((d.span(), d.with_argument(text, &quoted)))
    })
}

/// Remove `.` and resolve `..` without touching the file system.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> (String, usize) {
        let mut doc = SourceDocument::new("/thesis/chapterA/main.tex", text);
        let count = PathNormalization
            .apply(&mut doc, &AssemblyOptions::default())
            .unwrap();
        (doc.working_text, count)
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let (text, count) = run(
            "\\input{sections/intro}\n\\includegraphics[width=5cm]{../figs/./plot.pdf}\n",
        );
        assert_eq!(count, 2);
        assert_eq!(
            text,
            "\\input{\"/thesis/chapterA/sections/intro\"}\n\\includegraphics[width=5cm]{\"/thesis/figs/plot.pdf\"}\n"
        );
    }

    #[test]
    fn test_absolute_and_quoted_paths() {
        let (text, _) = run("\\include{\"/data/x.tex\"}");
        assert_eq!(text, "\\include{\"/data/x.tex\"}");
    }

    #[test]
    fn test_rerun_is_stable() {
        let (once, _) = run("\\input{sub} \\include{./a/../b}");
        let (twice, count) = run(&once);
        assert_eq!(once, twice);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_commented_reference_untouched() {
        let (text, count) = run("% \\input{old}\n");
        assert_eq!(text, "% \\input{old}\n");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
    }
}
