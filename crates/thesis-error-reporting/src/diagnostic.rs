//! Core diagnostic message types.
//!
//! This module defines the structures for representing diagnostic messages
//! (errors, warnings, info) following tidyverse-style guidelines.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A condition that was handled but deserves review
    Warning,
    /// Informational message
    Info,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
        }
    }
}

/// How detail items should be presented (tidyverse x/i bullet style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
    /// Note detail (plain bullet)
    Note,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: String,
}

/// A diagnostic message following tidyverse-style structure.
///
/// Structure:
/// 1. **Code**: optional error code (e.g., "T-1-1") for searchability
/// 2. **Title**: brief message
/// 3. **Kind**: Error, Warning, Info
/// 4. **Problem**: what went wrong
/// 5. **Details**: specific information (keys, paths, values)
/// 6. **Hints**: optional guidance for fixing (ends with ?)
/// 7. **Path**: the file the message is about, when there is one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    pub kind: DiagnosticKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<DetailItem>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub hints: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    ///
    /// Prefer [`DiagnosticMessageBuilder`](crate::DiagnosticMessageBuilder)
    /// for anything with details.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            path: None,
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

    /// Set the error code.
    ///
    /// Codes follow the format `T-<subsystem>-<number>` (e.g., "T-1-1").
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The catalog subsystem of this message's code, if it has a known one.
    pub fn subsystem(&self) -> Option<&'static str> {
        self.code
            .as_deref()
            .and_then(crate::catalog::get_subsystem)
    }

    /// Render this diagnostic message as text following tidyverse style.
    ///
    /// ```text
    /// Error [T-2-1]: Missing Transclusion Target
    /// Could not find `chapters/intro` (also tried `/thesis/chapters/intro.tex`)
    /// ✖ Error detail
    /// ℹ Info detail
    /// • Note detail
    /// ? Hint
    /// ```
    ///
    /// Lines are joined with `\n`; there is no trailing newline.
    pub fn to_text(&self) -> String {
        let mut result = match &self.code {
            Some(code) => format!("{} [{}]: {}", self.kind.label(), code, self.title),
            None => format!("{}: {}", self.kind.label(), self.title),
        };

        if let Some(path) = &self.path {
            write!(result, "\n  --> {}", path).ok();
        }

        if let Some(problem) = &self.problem {
            write!(result, "\n{}", problem).ok();
        }

        for detail in &self.details {
            write!(result, "\n{} {}", detail.kind.bullet(), detail.content).ok();
        }

        for hint in &self.hints {
            write!(result, "\n? {}", hint).ok();
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// Absent optional fields are omitted, so
    /// `DiagnosticMessage::error("x").to_json()` is `{"title":"x","kind":"error"}`.
    /// A cataloged code adds its `subsystem`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "kind": "error", "title": self.title })
        });
        if let (Some(subsystem), Some(object)) = (self.subsystem(), value.as_object_mut()) {
            object.insert("subsystem".to_string(), subsystem.into());
        }
        value
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}
