//! Import resolution.
//!
//! Starting from the main program, every import is loaded, parsed and
//! spliced into one merged translation unit. Modules are visited depth
//! first and a module's own imports land before its statements, so the
//! merged order is topological: dependencies precede their dependents
//! and the main program's statements come last.
//!
//! A set of canonical paths breaks both duplicate and cyclic imports;
//! the second encounter of a module produces a [`DuplicateImport`]
//! warning and the statement is dropped.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thor_session::diagnostics::{Diagnostic, IntoDiagnostic};
use thor_session::module_loader::{ModuleLoader, ModuleLoaderError};
use thor_session::sourcemap::{Source, SourceId, SourceMap};

use crate::ast::{Import, Program, Stmt};
use crate::parser::Parser;
use crate::Node;

/// Modules that resolve without touching the filesystem. Their
/// declarations are bodyless; the code generator treats calls to them
/// as built-ins.
pub fn builtin_module_source(module: &str) -> Option<&'static str> {
    match module {
        "std.io" => Some(
            "package std.io;\n\
             void println(string message);\n\
             void print(string message);\n\
             string input(string prompt);\n",
        ),
        _ => None,
    }
}

#[derive(Node!)]
pub struct DuplicateImport {
    pub module: String,
    pub first_path: PathBuf,
    pub importer: PathBuf,
}

impl IntoDiagnostic<()> for DuplicateImport {
    fn into_diagnostic(self, &(): &()) -> Diagnostic {
        Diagnostic::warning(format!("duplicate import of module \"{}\"", self.module))
            .with_note(format!("first imported from {}", self.first_path.display()))
            .with_note(format!("re-imported by {}", self.importer.display()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("module \"{module}\" not found")]
    ModuleNotFound {
        module: String,
        /// Source and line of the import statement.
        source_id: SourceId,
        line: u32,
    },

    #[error("failed to read {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// An imported module had lexical or syntactic errors. The
    /// diagnostics already point into the module's source.
    #[error("module \"{module}\" failed to parse")]
    InvalidModule {
        module: String,
        diagnostics: Vec<Diagnostic>,
    },
}

/// One merged module, in splice order.
#[derive(Node!)]
pub struct ResolvedModule {
    /// The module name as written in the import; `None` for the main
    /// program.
    pub name: Option<String>,
    pub package: Option<String>,
    pub statements: Vec<Stmt>,
    pub builtin: bool,
}

#[derive(Node!)]
pub struct ResolvedProgram {
    pub modules: Vec<ResolvedModule>,
    pub warnings: Vec<DuplicateImport>,
}

impl ResolvedProgram {
    /// Flattens the merged modules into a single program. Import and
    /// package statements are already stripped; the main program's
    /// package is kept.
    pub fn into_program(self) -> Program {
        let mut program = Program::default();

        for module in self.modules {
            if module.name.is_none() {
                program.package = module.package;
            }
            program.statements.extend(module.statements);
        }

        program
    }
}

pub struct ImportResolver<'a, 'src, L: ModuleLoader> {
    source_map: &'src mut SourceMap,
    loader: &'a L,

    resolved_paths: HashSet<PathBuf>,
    resolved_builtins: HashSet<String>,

    modules: Vec<ResolvedModule>,
    warnings: Vec<DuplicateImport>,
}

impl<'a, 'src, L: ModuleLoader> ImportResolver<'a, 'src, L> {
    pub fn new(source_map: &'src mut SourceMap, loader: &'a L) -> Self {
        Self {
            source_map,
            loader,

            resolved_paths: HashSet::new(),
            resolved_builtins: HashSet::new(),

            modules: vec![],
            warnings: vec![],
        }
    }

    /// Resolves every transitive import of `main`. `main_source` is
    /// the already-registered source of the main program, used to
    /// attribute errors in its import statements.
    pub fn run(
        mut self,
        main: Program,
        main_path: &Path,
        main_source: SourceId,
    ) -> Result<ResolvedProgram, ResolveError> {
        let main_path = canonical(main_path);
        self.resolved_paths.insert(main_path.clone());

        self.resolve_imports(&main.imports, &main_path, main_source)?;

        self.modules.push(ResolvedModule {
            name: None,
            package: main.package,
            statements: main.statements,
            builtin: false,
        });

        Ok(ResolvedProgram {
            modules: self.modules,
            warnings: self.warnings,
        })
    }

    fn resolve_imports(
        &mut self,
        imports: &[Import],
        importer: &Path,
        importer_source: SourceId,
    ) -> Result<(), ResolveError> {
        for import in imports {
            self.resolve_import(import, importer, importer_source)?;
        }
        Ok(())
    }

    fn resolve_import(
        &mut self,
        import: &Import,
        importer: &Path,
        importer_source: SourceId,
    ) -> Result<(), ResolveError> {
        if let Some(source) = builtin_module_source(&import.module) {
            return self.resolve_builtin(import, source, importer);
        }

        let loaded = self
            .loader
            .load(&import.module, importer.parent())
            .map_err(|error| match error {
                ModuleLoaderError::NotFound { module } => ResolveError::ModuleNotFound {
                    module,
                    source_id: importer_source,
                    line: import.line,
                },
                ModuleLoaderError::Io { path, io_error } => ResolveError::Io {
                    path,
                    error: io_error,
                },
            })?;

        if !self.resolved_paths.insert(loaded.path.clone()) {
            self.warnings.push(DuplicateImport {
                module: import.module.clone(),
                first_path: loaded.path,
                importer: importer.to_owned(),
            });
            return Ok(());
        }

        let display_path = loaded.path.display().to_string();
        let (program, source_id) =
            self.parse_module(&import.module, display_path, loaded.source)?;

        // Recurse before splicing so dependencies come first.
        self.resolve_imports(&program.imports, &loaded.path, source_id)?;

        self.modules.push(ResolvedModule {
            name: Some(import.module.clone()),
            package: program.package,
            statements: program.statements,
            builtin: false,
        });

        Ok(())
    }

    fn resolve_builtin(
        &mut self,
        import: &Import,
        source: &str,
        importer: &Path,
    ) -> Result<(), ResolveError> {
        if !self.resolved_builtins.insert(import.module.clone()) {
            self.warnings.push(DuplicateImport {
                module: import.module.clone(),
                first_path: PathBuf::from("<built-in>"),
                importer: importer.to_owned(),
            });
            return Ok(());
        }

        let name = format!("<built-in {}>", import.module);
        let (program, _) = self.parse_module(&import.module, name, source.to_owned())?;

        self.modules.push(ResolvedModule {
            name: Some(import.module.clone()),
            package: program.package,
            statements: program.statements,
            builtin: true,
        });

        Ok(())
    }

    fn parse_module(
        &mut self,
        module: &str,
        name: String,
        source: String,
    ) -> Result<(Program, SourceId), ResolveError> {
        let (source_id, source) = self.source_map.insert_and_get(Source { name, source });

        let (tokens, lex_errors) = crate::lex(&source.source);
        let (program, parse_errors) = Parser::new(tokens).parse();

        if !lex_errors.is_empty() || !parse_errors.is_empty() {
            let diagnostics = lex_errors
                .into_iter()
                .map(|error| error.into_diagnostic(&source_id))
                .chain(
                    parse_errors
                        .into_iter()
                        .map(|error| error.into_diagnostic(&source_id)),
                )
                .collect();

            return Err(ResolveError::InvalidModule {
                module: module.to_owned(),
                diagnostics,
            });
        }

        Ok((program, source_id))
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use thor_session::module_loader::HashMapLoader;

    use super::*;
    use crate::ast::Stmt;

    fn parse(source: &str) -> Program {
        let (tokens, lex_errors) = crate::lex(source);
        assert!(lex_errors.is_empty());

        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");

        program
    }

    fn resolve(
        main: &str,
        modules: &[(&str, &str)],
    ) -> Result<ResolvedProgram, ResolveError> {
        let loader = HashMapLoader {
            modules: modules
                .iter()
                .map(|&(name, source)| (name.to_owned(), source.to_owned()))
                .collect::<HashMap<_, _>>(),
        };

        let mut source_map = SourceMap::default();
        let main_source =
            source_map.insert(Source {
                name: "main.thor".to_owned(),
                source: main.to_owned(),
            });

        let main = parse(main);
        ImportResolver::new(&mut source_map, &loader).run(
            main,
            Path::new("main.thor"),
            main_source,
        )
    }

    fn module_names(resolved: &ResolvedProgram) -> Vec<Option<&str>> {
        resolved
            .modules
            .iter()
            .map(|module| module.name.as_deref())
            .collect()
    }

    fn func_names(program: &Program) -> Vec<&str> {
        program
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Func(func) => Some(func.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn dependencies_precede_dependents() {
        let resolved = resolve(
            "import \"a\";\nint main() { return 0; }",
            &[
                ("a", "import \"b\";\nint from_a() { return b(); }"),
                ("b", "int b() { return 1; }"),
            ],
        )
        .unwrap();

        assert_eq!(module_names(&resolved), vec![Some("b"), Some("a"), None]);
        assert!(resolved.warnings.is_empty());

        let program = resolved.into_program();
        assert_eq!(func_names(&program), vec!["b", "from_a", "main"]);
    }

    #[test]
    fn duplicate_import_warns_and_merges_once() {
        let resolved = resolve(
            "import \"a\";\nimport \"b\";\nint main() { return 0; }",
            &[
                ("a", "import \"b\";\nint from_a() { return 0; }"),
                ("b", "int b() { return 1; }"),
            ],
        )
        .unwrap();

        // `b` appears once even though it was imported twice.
        assert_eq!(module_names(&resolved), vec![Some("b"), Some("a"), None]);

        assert_eq!(resolved.warnings.len(), 1);
        let warning = &resolved.warnings[0];
        assert_eq!(warning.module, "b");
        assert_eq!(warning.importer, Path::new("main.thor"));
    }

    #[test]
    fn cyclic_imports_terminate() {
        let resolved = resolve(
            "import \"a\";\nint main() { return 0; }",
            &[
                ("a", "import \"b\";\nint a() { return 0; }"),
                ("b", "import \"a\";\nint b() { return 0; }"),
            ],
        )
        .unwrap();

        assert_eq!(module_names(&resolved), vec![Some("b"), Some("a"), None]);

        // The back edge surfaces as a duplicate, not infinite
        // recursion.
        assert_eq!(resolved.warnings.len(), 1);
        assert_eq!(resolved.warnings[0].module, "a");
    }

    #[test]
    fn module_not_found_points_at_the_import() {
        let loader = HashMapLoader {
            modules: HashMap::new(),
        };

        let text = "\nimport \"nope\";";
        let mut source_map = SourceMap::default();
        let main_source = source_map.insert(Source::new("main.thor", text));

        let error = ImportResolver::new(&mut source_map, &loader)
            .run(parse(text), Path::new("main.thor"), main_source)
            .unwrap_err();

        let ResolveError::ModuleNotFound { module, source_id, line } = error else {
            panic!("expected ModuleNotFound, got {error}");
        };
        assert_eq!(module, "nope");
        assert_eq!(source_id, main_source);
        assert_eq!(line, 2);
    }

    #[test]
    fn builtin_module_resolves_without_files() {
        let resolved = resolve("import \"std.io\";\nint main() { return 0; }", &[]).unwrap();

        assert_eq!(module_names(&resolved), vec![Some("std.io"), None]);
        assert!(resolved.modules[0].builtin);

        // Built-in declarations are bodyless.
        for stmt in &resolved.modules[0].statements {
            if let Stmt::Func(func) = stmt {
                assert!(func.body.is_none());
            }
        }
    }

    #[test]
    fn invalid_module_is_fatal() {
        let error = resolve("import \"bad\";", &[("bad", "int = ;")]).unwrap_err();

        let ResolveError::InvalidModule { module, diagnostics } = error else {
            panic!("expected InvalidModule, got {error}");
        };
        assert_eq!(module, "bad");
        assert!(!diagnostics.is_empty());
    }
}
