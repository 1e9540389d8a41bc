mod cli;
mod compiler;

use std::path::{Path, PathBuf};

use clap::Parser as _;
use temp_dir::TempDir;
use thor_backend::{Cc, CcError};
use thor_session::diagnostics::PrettyDiagnosticEmitter;
use thor_session::module_loader::FsLoader;

use crate::cli::{Cli, Command};
use crate::compiler::{CompileError, Compiler};

#[derive(thiserror::Error, Debug)]
enum ThorcError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Cc(#[from] CcError),
}

fn main() {
    if let Err(error) = run() {
        // Stage diagnostics were already printed by the session.
        if !matches!(error, ThorcError::Compile(CompileError::HadErrors)) {
            eprintln!("error: {error}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), ThorcError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            emit_c,
            include,
        } => {
            let mut compiler = Compiler::new(PrettyDiagnosticEmitter::default());
            let loader = FsLoader::new(include);

            let unit = compiler.compile_file(&input, &loader)?;

            if emit_c {
                match output {
                    Some(path) => std::fs::write(path, unit.source)?,
                    None => print!("{}", unit.source),
                }
                return Ok(());
            }

            let output = output.unwrap_or_else(|| default_output(&input));

            let dir = TempDir::new()?;
            let c_file = dir.child("out.c");
            std::fs::write(&c_file, unit.source)?;

            let cc = Cc::detect()?;
            cc.compile(&c_file, &output)?;

            Ok(())
        }
    }
}

/// `foo.thor` builds to `foo`; an extensionless input gets `.out` so
/// the executable never overwrites its own source.
fn default_output(input: &Path) -> PathBuf {
    let stripped = input.with_extension("");
    if stripped == input {
        input.with_extension("out")
    } else {
        stripped
    }
}
