//! Streaming diagnostic reporting.
//!
//! Unlike the [`DiagnosticSink`](crate::DiagnosticSink), which accumulates a
//! compilation step's diagnostics for inspection, a [`Reporter`] delivers
//! output to the user as it happens. The build driver holds two reporters:
//! one for compiler diagnostics, one for solution status messages.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for delivering diagnostics and status lines to the user.
pub trait Reporter {
    /// Reports a single diagnostic.
    fn report_diagnostic(&self, diag: &Diagnostic);

    /// Reports a plain status line (build order, watch summaries).
    fn report_status(&self, message: &str);
}

/// Renders diagnostics to stderr in a `severity[CODE]: message` format.
///
/// Produces output like:
/// ```text
/// error[C101]: failed to parse configuration
///   --> /work/app/tsconfig.json
///    = note: expected value at line 3 column 9
/// ```
pub struct ConsoleReporter {
    /// Whether to prefix status messages with a `message:` marker; status
    /// lines are otherwise printed verbatim.
    pub pretty: bool,
}

impl ConsoleReporter {
    /// Creates a new console reporter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();
        match diag.severity {
            Severity::Message => out.push_str(&diag.message),
            _ => out.push_str(&format!(
                "{}[{}]: {}",
                diag.severity, diag.code, diag.message
            )),
        }
        if let Some(file) = &diag.file {
            out.push_str(&format!("\n  --> {}", file.display()));
        }
        for note in &diag.notes {
            out.push_str(&format!("\n   = note: {note}"));
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    fn report_diagnostic(&self, diag: &Diagnostic) {
        eprintln!("{}", self.render(diag));
    }

    fn report_status(&self, message: &str) {
        if self.pretty {
            eprintln!("{message}");
        } else {
            println!("{message}");
        }
    }
}
