//! Error types for bibliography processing.

use std::path::PathBuf;
use thesis_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};

/// Result type alias for thesis-bib operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Longest fragment of offending entry text quoted in an error message.
const FRAGMENT_LIMIT: usize = 80;

/// Errors that can occur while loading, merging or writing bibliographies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Entry text does not have the shape `type{ key, ... }`.
    ///
    /// Fatal for the whole parse: the entry boundary scan cannot resynchronize
    /// past a malformed entry.
    #[error("Malformed bibliography entry{}: `{fragment}`", path_suffix(.path))]
    MalformedRecord {
        fragment: String,
        path: Option<PathBuf>,
    },

    /// A duplicate group named a key that is not in the collection.
    #[error("Record '{key}' not found while merging duplicates")]
    RecordNotFound { key: String },

    #[error("Failed to {action} '{}': {error}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in '{}'", path.display()),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn malformed(entry: &str, path: Option<&std::path::Path>) -> Self {
        let trimmed = entry.trim();
        let fragment = match trimmed.char_indices().nth(FRAGMENT_LIMIT) {
            Some((cut, _)) => format!("{}…", &trimmed[..cut]),
            None => trimmed.to_string(),
        };
        Error::MalformedRecord {
            fragment,
            path: path.map(|p| p.to_path_buf()),
        }
    }

    /// Convert this error to a DiagnosticMessage.
    ///
    /// Bibliography errors use T-1-* codes.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            Error::MalformedRecord { fragment, path } => {
                let mut builder = DiagnosticMessageBuilder::error("Malformed Record")
                    .with_code("T-1-1")
                    .problem("Bibliography entries must have the shape `@type{key, field = {value}, ...}`")
                    .add_detail(format!("Could not parse `{}`", fragment))
                    .add_hint("Is an opening or closing brace missing?");
                if let Some(path) = path {
                    builder = builder.with_path(path.display().to_string());
                }
                builder.build()
            }

            Error::RecordNotFound { key } => DiagnosticMessageBuilder::error("Record Not Found")
                .with_code("T-1-2")
                .problem(format!("Duplicate group refers to unknown key `{}`", key))
                .add_note("This is a bug in duplicate detection, not in the input")
                .build(),

            Error::Io {
                action,
                path,
                error,
            } => DiagnosticMessageBuilder::error("Bibliography I/O Error")
                .with_code("T-1-5")
                .with_path(path.display().to_string())
                .problem(format!("Failed to {} the bibliography", action))
                .add_detail(error.to_string())
                .build(),
        }
    }
}
