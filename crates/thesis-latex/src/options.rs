/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Assembly options.
 */

use serde::Deserialize;

/// Settings for document assembly, read from the `assembly` section of
/// `thesis.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Extension appended to transclusion targets that have none.
    pub default_extension: String,
    /// Tokens removed from transcluded content.
    pub end_markers: Vec<String>,
    pub max_transclusion_depth: usize,
    /// Inserted before the extension of the assembled output file.
    pub output_suffix: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            default_extension: "tex".to_string(),
            end_markers: vec!["\\endinput".to_string()],
            max_transclusion_depth: 32,
            output_suffix: "_combined".to_string(),
        }
    }
}
