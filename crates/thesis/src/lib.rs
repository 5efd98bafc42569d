//! Library side of the `thesis` command-line tool.
//!
//! The binary in `main.rs` parses arguments, sets up logging and calls into
//! [`commands`]; everything here is usable without a terminal.
//!
//! ```text
//! thesis bib merge chapter*/references.bib -o thesis.bib --renames renames.json
//! thesis assemble chapterA/main.tex chapterB/main.tex --renames renames.json -o body.tex
//! ```

pub mod commands;
pub mod config;
pub mod renames;
pub mod utils;

pub use config::{BibliographyConfig, ConfigError, ThesisConfig};
pub use renames::RenamePlan;
