//! Builder API for diagnostic messages.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};

/// Fluent builder for [`DiagnosticMessage`].
///
/// ```
/// use thesis_error_reporting::DiagnosticMessageBuilder;
///
/// let error = DiagnosticMessageBuilder::error("Malformed Record")
///     .with_code("T-1-1")
///     .problem("Entry does not have the shape `@type{key, ...}`")
///     .add_detail("Found `@article keyA`")
///     .add_hint("Is the opening brace missing?")
///     .build();
///
/// assert_eq!(error.code.as_deref(), Some("T-1-1"));
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Attach the file this message is about.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.message.path = Some(path.into());
        self
    }

    /// The problem statement (what went wrong).
    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖ bullet).
    pub fn add_detail(self, content: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Error, content)
    }

    /// Add an info detail (ℹ bullet).
    pub fn add_info(self, content: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Info, content)
    }

    /// Add a note detail (• bullet).
    pub fn add_note(self, content: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Note, content)
    }

    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    fn push_detail(mut self, kind: DetailKind, content: impl Into<String>) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content: content.into(),
        });
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_details_in_order() {
        let msg = DiagnosticMessageBuilder::error("Title")
            .add_detail("first")
            .add_info("second")
            .add_note("third")
            .build();

        let kinds: Vec<DetailKind> = msg.details.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DetailKind::Error, DetailKind::Info, DetailKind::Note]);
        assert_eq!(msg.details[1].content, "second");
    }

    #[test]
    fn test_builder_path_and_hints() {
        let msg = DiagnosticMessageBuilder::warning("Title")
            .with_path("a.bib")
            .add_hint("one?")
            .add_hint("two?")
            .build();

        assert_eq!(msg.path.as_deref(), Some("a.bib"));
        assert_eq!(msg.hints, vec!["one?".to_string(), "two?".to_string()]);
    }
}
