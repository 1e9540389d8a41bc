//! The stage sequencing for one compilation.
//!
//! Every stage reports its diagnostics through the session before the
//! next stage runs; a stage that produced errors stops the pipeline,
//! so partial ASTs never reach import resolution or code generation.
//! Duplicate-import warnings are the one non-fatal diagnostic.

use std::path::Path;

use thor_backend::CUnit;
use thor_frontend::{ImportResolver, ResolveError, ResolvedProgram};
use thor_session::diagnostics::{Diagnostic, DiagnosticEmitter};
use thor_session::module_loader::ModuleLoader;
use thor_session::sourcemap::{Source, SourceId};
use thor_session::{ErrorsEmitted, Session};

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("errors while compiling")]
    HadErrors,
}

impl From<ErrorsEmitted> for CompileError {
    fn from(_: ErrorsEmitted) -> Self {
        Self::HadErrors
    }
}

pub struct Compiler<D: DiagnosticEmitter> {
    pub session: Session<D>,
}

impl<D: DiagnosticEmitter> Compiler<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            session: Session::new(diagnostics),
        }
    }

    pub fn compile_file<L: ModuleLoader>(
        &mut self,
        path: &Path,
        loader: &L,
    ) -> Result<CUnit, CompileError> {
        let source = std::fs::read_to_string(path)?;
        self.compile_source(path, source, loader)
    }

    pub fn compile_source<L: ModuleLoader>(
        &mut self,
        path: &Path,
        source: String,
        loader: &L,
    ) -> Result<CUnit, CompileError> {
        let (source_id, source) = self
            .session
            .sources
            .insert_and_get(Source::new(path.display().to_string(), source));

        let (tokens, lex_errors) = thor_frontend::lex(&source.source);
        self.session.report_all(lex_errors, &source_id)?;

        let (program, parse_errors) = thor_frontend::parse(tokens);
        self.session.report_all(parse_errors, &source_id)?;

        let resolved = self.resolve(program, path, loader, source_id)?;

        match thor_backend::generate(&resolved) {
            Ok(unit) => Ok(unit),
            Err(error) => {
                self.session.report(error, &())?;
                Err(CompileError::HadErrors)
            }
        }
    }

    fn resolve<L: ModuleLoader>(
        &mut self,
        program: thor_frontend::ast::Program,
        path: &Path,
        loader: &L,
        source_id: SourceId,
    ) -> Result<ResolvedProgram, CompileError> {
        let resolver = ImportResolver::new(&mut self.session.sources, loader);

        let resolved = match resolver.run(program, path, source_id) {
            Ok(resolved) => resolved,

            Err(ResolveError::InvalidModule { diagnostics, .. }) => {
                for diagnostic in diagnostics {
                    self.session.emit(diagnostic);
                }
                return Err(CompileError::HadErrors);
            }

            Err(error @ ResolveError::ModuleNotFound { source_id, line, .. }) => {
                self.session.emit(
                    Diagnostic::error(error.to_string())
                        .with_source(source_id)
                        .with_line(line),
                );
                return Err(CompileError::HadErrors);
            }

            Err(error @ ResolveError::Io { .. }) => {
                self.session.emit(Diagnostic::error(error.to_string()));
                return Err(CompileError::HadErrors);
            }
        };

        self.session.report_all(resolved.warnings.clone(), &())?;

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use temp_dir::TempDir;
    use thor_session::diagnostics::{Diagnostic, Severity};
    use thor_session::module_loader::{FsLoader, HashMapLoader};

    use super::*;

    fn compiler() -> Compiler<Vec<Diagnostic>> {
        Compiler::new(vec![])
    }

    fn loader(modules: &[(&str, &str)]) -> HashMapLoader {
        HashMapLoader {
            modules: modules
                .iter()
                .map(|&(name, source)| (name.to_owned(), source.to_owned()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn compile(main: &str, modules: &[(&str, &str)]) -> (Result<CUnit, CompileError>, Vec<Diagnostic>) {
        let mut compiler = compiler();
        let result = compiler.compile_source(
            Path::new("main.thor"),
            main.to_owned(),
            &loader(modules),
        );
        (result, compiler.session.diagnostics)
    }

    #[test]
    fn end_to_end_with_modules() {
        let (result, diagnostics) = compile(
            "import \"util\";\nint main() { return twice(21); }",
            &[("util", "int twice(int n) { return n * 2; }")],
        );

        let unit = result.unwrap();
        assert!(diagnostics.is_empty());
        assert!(unit.source.contains("int util_twice(int n)"));
        assert!(unit.source.contains("return util_twice(21);"));
    }

    #[test]
    fn lex_errors_stop_before_parse() {
        let (result, diagnostics) = compile("int x = \"unterminated", &[]);

        assert!(matches!(result, Err(CompileError::HadErrors)));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("unterminated string"));
    }

    #[test]
    fn all_parse_errors_are_reported() {
        let (result, diagnostics) = compile("int = 1;\nint = 2;\nint ok = 3;", &[]);

        assert!(matches!(result, Err(CompileError::HadErrors)));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn duplicate_import_is_a_warning_only() {
        let (result, diagnostics) = compile(
            "import \"a\";\nimport \"a\";\nint main() { return 0; }",
            &[("a", "int a() { return 1; }")],
        );

        assert!(result.is_ok());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("duplicate import"));
    }

    #[test]
    fn missing_module_is_fatal() {
        let (result, diagnostics) = compile("import \"nope\";\nint main() { return 0; }", &[]);

        assert!(matches!(result, Err(CompileError::HadErrors)));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, Some(1));
        assert!(diagnostics[0].message.contains("nope"));
    }

    #[test]
    fn errors_in_imported_module_point_at_it() {
        let (result, diagnostics) = compile(
            "import \"bad\";\nint main() { return 0; }",
            &[("bad", "int = ;")],
        );

        assert!(matches!(result, Err(CompileError::HadErrors)));
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().all(|d| d.source.is_some()));
    }

    #[test]
    fn builtin_io_module() {
        let (result, diagnostics) = compile(
            "import \"std.io\";\nint main() { println(\"hi\"); return 0; }",
            &[],
        );

        assert!(diagnostics.is_empty());
        assert!(result.unwrap().source.contains("thor_println(\"hi\");"));
    }

    #[test]
    fn compile_file_with_fs_modules() {
        let dir = TempDir::new().unwrap();

        let util = dir.child("util.thor");
        std::fs::write(&util, "int twice(int n) { return n * 2; }").unwrap();

        let main = dir.child("main.thor");
        std::fs::write(&main, "import \"util\";\nint main() { return twice(4); }").unwrap();

        let mut compiler = compiler();
        let unit = compiler
            .compile_file(&main, &FsLoader::new(vec![]))
            .unwrap();

        assert!(compiler.session.diagnostics.is_empty());
        assert!(unit.source.contains("util_twice"));
    }

    #[test]
    fn search_paths_are_probed() {
        let dir = TempDir::new().unwrap();
        let lib_dir = dir.child("lib");
        std::fs::create_dir(&lib_dir).unwrap();
        std::fs::write(lib_dir.join("util.thor"), "int one() { return 1; }").unwrap();

        let main = dir.child("main.thor");
        std::fs::write(&main, "import \"util\";\nint main() { return one(); }").unwrap();

        let mut compiler = compiler();
        let unit = compiler
            .compile_file(&main, &FsLoader::new(vec![PathBuf::from(&lib_dir)]))
            .unwrap();

        assert!(unit.source.contains("util_one"));
    }
}
