/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for document assembly.
 */

//! Error types for thesis-latex

use std::path::PathBuf;
use thesis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    /// `\input{target}` could not be found as given or relative to the
    /// document directory. Assembly cannot continue.
    #[error("Transclusion target '{target}' not found (searched as given and in '{}')", .directory.display())]
    MissingTransclusionTarget { target: String, directory: PathBuf },

    /// A file transcludes itself, directly or through other files.
    #[error("Transclusion cycle: {}", display_chain(.chain))]
    TransclusionCycle { chain: Vec<PathBuf> },

    #[error("Transclusion nested deeper than {limit} levels at '{}'", .path.display())]
    TransclusionDepthExceeded { limit: usize, path: PathBuf },

    #[error("Failed to {action} '{}': {error}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl AssemblyError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            error,
        }
    }

    /// Convert this error to a DiagnosticMessage (T-2-* codes).
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            AssemblyError::MissingTransclusionTarget { target, directory } => {
                DiagnosticMessageBuilder::error("Missing Transclusion Target")
                    .with_code("T-2-1")
                    .problem(format!("Cannot find the file for `\\input{{{}}}`", target))
                    .add_info(format!("Also searched in {}", directory.display()))
                    .add_hint("Is the file name spelled correctly, and is it committed?")
                    .build()
            }
            AssemblyError::TransclusionCycle { chain } => {
                let mut builder = DiagnosticMessageBuilder::error("Transclusion Cycle")
                    .with_code("T-2-2")
                    .problem("A file includes itself, directly or indirectly");
                for path in chain {
                    builder = builder.add_note(path.display().to_string());
                }
                builder.build()
            }
            AssemblyError::TransclusionDepthExceeded { limit, path } => {
                DiagnosticMessageBuilder::error("Transclusion Too Deep")
                    .with_code("T-2-3")
                    .with_path(path.display().to_string())
                    .problem(format!("Files are nested more than {} levels deep", limit))
                    .add_hint("Raise `assembly.max_transclusion_depth` in thesis.yml if this is intended")
                    .build()
            }
            AssemblyError::Io {
                action,
                path,
                error,
            } => DiagnosticMessageBuilder::error("Document I/O Error")
                .with_code("T-2-4")
                .with_path(path.display().to_string())
                .problem(format!("Failed to {} the document", action))
                .add_detail(error.to_string())
                .build(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
