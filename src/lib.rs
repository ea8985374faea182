pub mod cli;
pub mod editor;
pub mod error;
pub mod language;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use editor::Editor;
use language::LanguageDefinition;

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
}

fn language(devices: Option<&Path>) -> anyhow::Result<LanguageDefinition> {
    let devices = match devices {
        Some(path) => language::devices::parse_devices(&read(path)?)
            .with_context(|| format!("Parsing device catalog {}", path.display()))?,
        None => Vec::new(),
    };
    Ok(LanguageDefinition::build(&devices))
}

fn open(path: &Path, devices: Option<&Path>) -> anyhow::Result<Editor> {
    let mut editor = Editor::new(language(devices)?);
    editor
        .import_json(&read(path)?)
        .with_context(|| format!("Parsing program {}", path.display()))?;
    Ok(editor)
}

fn write_out(output: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Writing {}", path.display()))?;
            info!(path = %path.display(), "program written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Check { program, devices } => {
            let editor = open(&program, devices.as_deref())?;
            let analysis = editor.analysis();

            for (severity, map) in [("error", &analysis.errors), ("warning", &analysis.warnings)] {
                for (uuid, diagnostics) in map {
                    let id = editor
                        .program()
                        .find_statement(*uuid)
                        .map_or("?", |s| s.id.as_str());
                    for diag in diagnostics {
                        println!("{severity}: {id} ({uuid}) {}: {}", diag.kind, diag.message);
                    }
                }
            }
            for dangling in &analysis.dangling {
                println!(
                    "warning: {:?} references removed statement {}",
                    dangling.source, dangling.uuid
                );
            }

            let errors = analysis.error_count();
            if errors > 0 {
                anyhow::bail!("{} has {errors} error(s)", program.display());
            }
            println!("{}: ok ({} warning(s))", program.display(), analysis.warning_count());
        }
        Command::Fmt { program, output } => {
            let editor = open(&program, None)?;
            write_out(output.as_ref(), &editor.export_json())?;
        }
        Command::Render { program, devices } => {
            let editor = open(&program, devices.as_deref())?;
            print!("{}", writer::text::render(editor.program(), editor.analysis()));
        }
        Command::Merge {
            program,
            procedures,
            output,
        } => {
            let mut editor = open(&program, None)?;
            editor
                .import_procedures(&read(&procedures)?)
                .with_context(|| format!("Importing procedures from {}", procedures.display()))?;
            write_out(output.as_ref(), &editor.export_json())?;
        }
    }

    Ok(())
}
