//! Plain-text listing of a program: one statement per line, nested blocks
//! indented, expressions rendered inline and diagnostics appended.

use std::io::{self, Write};

use serde_json::Value;

use crate::model::expression::parse_grouped_expressions;
use crate::model::{Argument, ArgumentValue, Block, Program, ValueType};
use crate::processor::analyzer::Analysis;
use crate::processor::visitor::walk;

fn render_argument(arg: &Argument) -> String {
    match &arg.value {
        ArgumentValue::Expressions(list) if list.is_empty() => "?".to_string(),
        ArgumentValue::Expressions(list) => parse_grouped_expressions(list),
        ArgumentValue::Literal(Value::Null) => "?".to_string(),
        ArgumentValue::Literal(Value::String(name)) if arg.ty == ValueType::Variable => {
            format!("${name}")
        }
        ArgumentValue::Literal(value) => value.to_string(),
    }
}

fn block_lines(block: &Block, analysis: &Analysis, base: usize, lines: &mut Vec<String>) {
    walk(block, None, &mut |ctx| {
        let stmt = ctx.statement;
        let mut line = format!("{}{}", "  ".repeat(base + ctx.depth), stmt.id);
        for arg in stmt.arguments() {
            line.push(' ');
            line.push_str(&render_argument(arg));
        }
        for diag in analysis
            .errors_for(stmt.uuid)
            .iter()
            .chain(analysis.warnings_for(stmt.uuid))
        {
            line.push_str(&format!("  # {}: {}", diag.kind, diag.message));
        }
        lines.push(line);
    });
}

fn listing(program: &Program, analysis: &Analysis) -> Vec<String> {
    let mut lines = Vec::new();
    for (id, body) in &program.header.user_procedures {
        lines.push(format!("procedure {id}:"));
        block_lines(body, analysis, 1, &mut lines);
    }
    lines.push("block:".to_string());
    block_lines(&program.block, analysis, 1, &mut lines);
    lines
}

pub fn emit(program: &Program, analysis: &Analysis, out: &mut impl Write) -> io::Result<()> {
    for line in listing(program, analysis) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Same text as [`emit`], one `\n`-terminated line per entry.
pub fn render(program: &Program, analysis: &Analysis) -> String {
    listing(program, analysis)
        .into_iter()
        .map(|line| line + "\n")
        .collect()
}
