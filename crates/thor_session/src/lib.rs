pub mod diagnostics;
pub mod module_loader;
pub mod sourcemap;

use diagnostics::{Diagnostic, DiagnosticEmitter, IntoDiagnostic, Severity};
use sourcemap::SourceMap;

/// Returned by [`Session::report`] and friends when at least one of the
/// reported diagnostics was an error.
#[derive(Debug, Clone, Copy)]
pub struct ErrorsEmitted;

/// State shared by every stage of one compilation: the sources seen so
/// far and the sink that diagnostics are emitted into.
pub struct Session<D: DiagnosticEmitter> {
    pub sources: SourceMap,
    pub diagnostics: D,
}

impl<D: DiagnosticEmitter> Session<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            sources: SourceMap::default(),
            diagnostics,
        }
    }

    /// Emits an already-built [`Diagnostic`]; returns whether it was
    /// an error.
    pub fn emit(&mut self, diagnostic: Diagnostic) -> bool {
        let is_error = diagnostic.severity >= Severity::Error;
        self.diagnostics.emit_diagnostic(diagnostic, &self.sources);
        is_error
    }

    pub fn report<Context>(
        &mut self,
        diagnostic: impl IntoDiagnostic<Context>,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted> {
        if self.emit(diagnostic.into_diagnostic(cx)) {
            Err(ErrorsEmitted)
        } else {
            Ok(())
        }
    }

    /// Reports every diagnostic in the batch; the outcome reflects
    /// whether any of them was an error.
    pub fn report_all<Context, I>(
        &mut self,
        diagnostics: I,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted>
    where
        I: IntoIterator,
        I::Item: IntoDiagnostic<Context>,
    {
        let mut outcome = Ok(());

        for diagnostic in diagnostics {
            if self.report(diagnostic, cx).is_err() {
                outcome = Err(ErrorsEmitted);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session<Vec<Diagnostic>> {
        Session::new(vec![])
    }

    #[test]
    fn warnings_alone_do_not_fail_a_batch() {
        let mut session = session();

        let warnings = [Diagnostic::warning("w1"), Diagnostic::warning("w2")];
        assert!(session.report_all(warnings, &()).is_ok());
        assert_eq!(session.diagnostics.len(), 2);
    }

    #[test]
    fn a_batch_with_an_error_fails_but_emits_everything() {
        let mut session = session();

        let batch = [
            Diagnostic::warning("w"),
            Diagnostic::error("e"),
            Diagnostic::warning("after"),
        ];
        assert!(session.report_all(batch, &()).is_err());
        assert_eq!(session.diagnostics.len(), 3);
    }
}
