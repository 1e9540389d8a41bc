//! The diagnostic model shared by every compilation stage.
//!
//! Stages collect their own error types and convert them with
//! [`IntoDiagnostic`] when reporting through the session. Warnings and
//! errors render with distinct prefixes; extra context lines (such as
//! the two paths of a duplicate-import warning) go into `notes`, one
//! line each.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::sourcemap::{SourceId, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,

    pub source: Option<SourceId>,
    /// 1-based line the diagnostic points at, if known.
    pub line: Option<u32>,

    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            source: None,
            line: None,
            notes: vec![],
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

pub trait IntoDiagnostic<Context: ?Sized> {
    fn into_diagnostic(self, cx: &Context) -> Diagnostic;
}

impl IntoDiagnostic<()> for Diagnostic {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        self
    }
}

pub trait DiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap);
}

/// Collects diagnostics instead of printing them. Used in tests.
impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, _sources: &SourceMap) {
        self.push(diagnostic);
    }
}

pub struct PrettyDiagnosticEmitter {
    pub stream: StandardStream,
}

impl Default for PrettyDiagnosticEmitter {
    fn default() -> Self {
        Self {
            stream: StandardStream::stderr(ColorChoice::Auto),
        }
    }
}

impl DiagnosticEmitter for PrettyDiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap) {
        // Failing to write a diagnostic leaves nothing sensible to do.
        let _ = self.write_diagnostic(&diagnostic, sources);
    }
}

impl PrettyDiagnosticEmitter {
    fn write_diagnostic(
        &mut self,
        diagnostic: &Diagnostic,
        sources: &SourceMap,
    ) -> std::io::Result<()> {
        let (prefix, color) = match diagnostic.severity {
            Severity::Warning => ("warning", Color::Yellow),
            Severity::Error => ("error", Color::Red),
        };

        self.stream
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.stream, "{prefix}")?;
        self.stream.reset()?;

        writeln!(self.stream, ": {}", diagnostic.message)?;

        let source_name = diagnostic.source.and_then(|id| sources.name(id));
        match (source_name, diagnostic.line) {
            (Some(name), Some(line)) => writeln!(self.stream, "  --> {name}:{line}")?,
            (Some(name), None) => writeln!(self.stream, "  --> {name}")?,
            (None, Some(line)) => writeln!(self.stream, "  --> line {line}")?,
            (None, None) => {}
        }

        for note in &diagnostic.notes {
            writeln!(self.stream, "  {note}")?;
        }

        Ok(())
    }
}
