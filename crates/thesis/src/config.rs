//! `thesis.yml` loading.
//!
//! ```yaml
//! bibliography:
//!   control_markers: [comment, preamble, string]
//!   similarity:
//!     threshold: 4
//! assembly:
//!   max_transclusion_depth: 16
//!   output_suffix: _merged
//! ```
//!
//! Every section and field is optional; a missing file means defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thesis_bib::{ParseOptions, SimilarityConfig};
use thesis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use thesis_latex::AssemblyOptions;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "thesis.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {error}")]
    Parse {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },
}

impl ConfigError {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            ConfigError::Read { path, error } => DiagnosticMessageBuilder::error("Invalid Configuration")
                .with_code("T-3-1")
                .with_path(path.display().to_string())
                .problem("The configuration file could not be read")
                .add_detail(error.to_string())
                .build(),
            ConfigError::Parse { path, error } => {
                let mut builder = DiagnosticMessageBuilder::error("Invalid Configuration")
                    .with_code("T-3-1")
                    .with_path(path.display().to_string())
                    .problem("The configuration file is not valid")
                    .add_detail(error.to_string());
                if let Some(location) = error.location() {
                    builder = builder.add_info(format!(
                        "At line {}, column {}",
                        location.line(),
                        location.column()
                    ));
                }
                builder
                    .add_hint("Top-level sections are `bibliography` and `assembly`")
                    .build()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThesisConfig {
    pub bibliography: BibliographyConfig,
    pub assembly: AssemblyOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BibliographyConfig {
    pub similarity: SimilarityConfig,
    /// Entry types kept verbatim instead of parsed as records.
    pub control_markers: Vec<String>,
}

impl Default for BibliographyConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            control_markers: ParseOptions::default().control_markers,
        }
    }
}

impl BibliographyConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            control_markers: self.control_markers.clone(),
        }
    }
}

impl ThesisConfig {
    /// Load `explicit` if given, otherwise `thesis.yml` in `working_dir` if
    /// it exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        let discovered = working_dir.join(CONFIG_FILE_NAME);
        if discovered.is_file() {
            Self::from_path(&discovered)
        } else {
            tracing::debug!(dir = %working_dir.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_yaml(&text, path)
    }

    /// Parse configuration text; `path` is only used in errors.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file (or one holding only comments) deserializes as unit.
        if text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        }) {
            return Ok(Self::default());
        }

        serde_yaml::from_str(text).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ThesisConfig, ConfigError> {
        ThesisConfig::from_yaml(text, Path::new("thesis.yml"))
    }

    #[test]
    fn test_empty_file_means_defaults() {
        assert_eq!(parse("").unwrap(), ThesisConfig::default());
        assert_eq!(parse("# nothing yet\n").unwrap(), ThesisConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse(
            "bibliography:\n  similarity:\n    threshold: 4\nassembly:\n  output_suffix: _merged\n",
        )
        .unwrap();

        assert_eq!(config.bibliography.similarity.threshold, 4);
        assert_eq!(
            config.bibliography.similarity.identity_fields,
            vec!["title", "doi", "isbn"]
        );
        assert_eq!(config.bibliography.control_markers.len(), 4);
        assert_eq!(config.assembly.output_suffix, "_merged");
        assert_eq!(config.assembly.max_transclusion_depth, 32);
    }

    #[test]
    fn test_control_markers_feed_parse_options() {
        let config = parse("bibliography:\n  control_markers: [comment]\n").unwrap();
        assert_eq!(config.bibliography.parse_options().control_markers, vec!["comment"]);
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let err = parse("bibliografy:\n  threshold: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let text = err.to_diagnostic().to_text();
        assert!(text.starts_with("Error [T-3-1]: Invalid Configuration"), "Got: {}", text);
        assert!(text.contains("bibliografy"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = parse("assembly:\n  max_transclusion_depth: deep\n").unwrap_err();
        assert!(err.to_diagnostic().to_text().contains("line 2"));
    }

    #[test]
    fn test_discovery() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ThesisConfig::load(None, dir.path()).unwrap(),
            ThesisConfig::default()
        );

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "assembly:\n  default_extension: ltx\n",
        )
        .unwrap();
        let config = ThesisConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.assembly.default_extension, "ltx");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("other.yml");
        let err = ThesisConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
