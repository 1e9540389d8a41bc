use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a program.
    Build {
        /// The input file.
        input: PathBuf,

        /// The output file. Defaults to the input path without its
        /// extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the generated C instead of compiling it; to stdout
        /// unless an output file is given.
        #[arg(long, action)]
        emit_c: bool,

        /// Additional directories to search for imported modules.
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
    },
}
