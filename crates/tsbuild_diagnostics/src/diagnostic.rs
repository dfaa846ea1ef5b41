//! Structured diagnostic messages with severity, codes, and notes.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A structured diagnostic message.
///
/// Diagnostics are the single mechanism for reporting problems and status to
/// the user. A diagnostic names the file it concerns when there is one (a
/// configuration file, an input, an output) rather than a byte range; the
/// solution builder operates on whole files and timestamps, not source text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The file this diagnostic concerns, if any.
    pub file: Option<PathBuf>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a new status message diagnostic.
    pub fn message(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Message, code, message)
    }

    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            file: None,
            notes: Vec::new(),
        }
    }

    /// Attaches the file this diagnostic concerns.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Config, 101),
            "unexpected token in configuration",
        );
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(format!("{}", diag.code), "C101");
        assert!(diag.file.is_none());
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Build, 301), "input missing")
            .with_file("/work/src/a.ts")
            .with_note("the file was listed in tsconfig.json");
        assert_eq!(diag.file.as_deref(), Some(std::path::Path::new("/work/src/a.ts")));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn message_severity() {
        let diag = Diagnostic::message(
            DiagnosticCode::new(Category::Build, 1),
            "Projects in this build: app",
        );
        assert_eq!(diag.severity, Severity::Message);
    }

    #[test]
    fn serde_roundtrip() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Watch, 201), "slow watcher")
            .with_file("/work/tsconfig.json");
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.severity, Severity::Warning);
        assert_eq!(back.message, "slow watcher");
        assert_eq!(back.file, diag.file);
    }
}
