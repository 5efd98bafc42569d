use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expand glob patterns into a list of file paths.
///
/// A pattern without glob characters (`*`, `?`, `[`) is a literal path and
/// must exist. Matches of one pattern come back sorted; patterns keep the
/// order they were given in, since that order decides which bibliography
/// keeps a contested key.
pub fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let paths = glob::glob(pattern)
                .with_context(|| format!("Invalid glob pattern: {}", pattern))?;

            let mut matches = Vec::new();
            for path in paths {
                let path =
                    path.with_context(|| format!("Failed to read glob match for: {}", pattern))?;
                if path.is_file() {
                    matches.push(path);
                }
            }

            if matches.is_empty() {
                tracing::warn!(pattern = %pattern, "No files matched pattern");
            }
            matches.sort();
            files.extend(matches);
        } else {
            let path = PathBuf::from(pattern);
            if !path.exists() {
                anyhow::bail!("File not found: {}", pattern);
            }
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pattern(dir: &tempfile::TempDir, rest: &str) -> String {
        dir.path().join(rest).display().to_string()
    }

    #[test]
    fn test_literal_paths_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.bib"), "").unwrap();
        fs::write(dir.path().join("a.bib"), "").unwrap();

        let result = expand_globs(&[pattern(&dir, "b.bib"), pattern(&dir, "a.bib")]).unwrap();
        assert_eq!(
            result,
            vec![dir.path().join("b.bib"), dir.path().join("a.bib")]
        );
    }

    #[test]
    fn test_glob_matches_are_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        for chapter in ["chapterB", "chapterA"] {
            fs::create_dir(dir.path().join(chapter)).unwrap();
            fs::write(dir.path().join(chapter).join("references.bib"), "").unwrap();
        }
        fs::create_dir(dir.path().join("chapterC")).unwrap();

        let result = expand_globs(&[pattern(&dir, "chapter*/references.bib")]).unwrap();
        assert_eq!(
            result,
            vec![
                dir.path().join("chapterA/references.bib"),
                dir.path().join("chapterB/references.bib"),
            ]
        );
    }

    #[test]
    fn test_unmatched_glob_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(expand_globs(&[pattern(&dir, "*.tex")]).unwrap().is_empty());
    }

    #[test]
    fn test_nonexistent_file_errors() {
        let patterns = vec!["file-that-does-not-exist.bib".to_string()];
        let result = expand_globs(&patterns);
        assert!(result.unwrap_err().to_string().contains("File not found"));
    }
}
