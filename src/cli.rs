use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a program and print its diagnostics; fails on errors
    Check {
        /// Program .json document
        program: PathBuf,
        /// Device catalog .json used to build the language
        #[arg(long)]
        devices: Option<PathBuf>,
    },
    /// Normalize a program through import and export
    Fmt {
        program: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the statement tree with rendered expressions
    Render {
        program: PathBuf,
        #[arg(long)]
        devices: Option<PathBuf>,
    },
    /// Import the user procedures of another document into a program
    Merge {
        program: PathBuf,
        /// Document (or bare header) holding `userProcedures`
        procedures: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
