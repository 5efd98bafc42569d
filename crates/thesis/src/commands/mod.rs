//! Command implementations for the thesis CLI.
//!
//! Each command does its work through the library crates and returns a
//! summary that `main` prints.

pub mod assemble;
pub mod bib;

use colored::Colorize;
use thesis_error_reporting::DiagnosticMessage;

/// A library diagnostic carried through `anyhow` until `main` renders it.
#[derive(Debug, thiserror::Error)]
#[error("{}", .0.to_text().trim_end())]
pub struct DiagnosticError(pub DiagnosticMessage);

/// Wrap a library diagnostic so it is printed as rendered text, or as JSON
/// with `--json-errors`.
pub fn diagnostic_error(diagnostic: DiagnosticMessage) -> anyhow::Error {
    DiagnosticError(diagnostic).into()
}

/// Render a diagnostic for stderr.
pub fn render_diagnostic(diagnostic: &DiagnosticMessage, json: bool) -> String {
    if json {
        diagnostic.to_json().to_string()
    } else {
        diagnostic.to_text()
    }
}

/// Render a failed command for stderr. Errors that are not diagnostics
/// become an uncoded error diagnostic in JSON mode.
pub fn render_error(error: &anyhow::Error, json: bool) -> String {
    match (error.downcast_ref::<DiagnosticError>(), json) {
        (Some(DiagnosticError(diagnostic)), true) => render_diagnostic(diagnostic, true),
        (None, true) => render_diagnostic(&DiagnosticMessage::error(format!("{:#}", error)), true),
        (_, false) => format!("{} {:#}", "✗".red(), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thesis_error_reporting::DiagnosticMessageBuilder;

    fn missing_target() -> anyhow::Error {
        diagnostic_error(
            DiagnosticMessageBuilder::error("Missing Transclusion Target")
                .with_code("T-2-1")
                .problem("Could not find `sections/methods`")
                .build(),
        )
    }

    #[test]
    fn test_diagnostic_error_displays_rendered_text() {
        let error = missing_target();
        assert_eq!(
            error.to_string(),
            "Error [T-2-1]: Missing Transclusion Target\nCould not find `sections/methods`"
        );
        assert!(render_error(&error, false).ends_with("Could not find `sections/methods`"));
    }

    #[test]
    fn test_json_errors_carry_code_and_subsystem() {
        let rendered = render_error(&missing_target(), true);
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["code"], "T-2-1");
        assert_eq!(json["subsystem"], "assembly");
        assert_eq!(json["kind"], "error");
    }

    #[test]
    fn test_plain_errors_become_uncoded_json() {
        let error = anyhow::anyhow!("No documents to assemble");
        let json: serde_json::Value = serde_json::from_str(&render_error(&error, true)).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "No documents to assemble", "kind": "error" }));
    }
}
